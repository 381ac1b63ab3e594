//! Unit tests for the stream contract, against in-memory stream
//! implementations of the kind concrete formats would provide.

use std::sync::Once;

use liftlog::{
    pc, AnyRelation, IoDirectives, IoError, Pc, ReadStreamFactory, Relation, StreamRegistry,
    SymbolMask, TupleReadStream, TupleWriteStream, Val,
};

fn setup() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        pc::init(&["A", "B"], None).expect("first init");
    });
}

/// Reads tuples from a preloaded list of `(fields, pc-text)` pairs.
struct VecReadStream {
    rows: std::vec::IntoIter<(Vec<Val>, String)>,
}

impl TupleReadStream for VecReadStream {
    fn read_next_tuple(&mut self) -> Result<Option<(Vec<Val>, Pc)>, IoError> {
        for (fields, text) in self.rows.by_ref() {
            // Unparseable conditions are diagnosed and the tuple skipped,
            // mirroring what a file-backed reader does.
            match Pc::parse(&text) {
                Some(pc) => return Ok(Some((fields, pc))),
                None => continue,
            }
        }
        Ok(None)
    }
}

/// Collects written tuples as `(fields, rendered pc)` pairs.
#[derive(Default)]
struct VecWriteStream {
    rows: Vec<(Vec<Val>, String)>,
    nullary_emitted: bool,
}

impl TupleWriteStream for VecWriteStream {
    fn write_next_tuple(&mut self, record: &liftlog::RecordRef<'_>) -> Result<(), IoError> {
        self.rows
            .push((record.fields().to_vec(), record.pc().to_string()));
        Ok(())
    }

    fn write_nullary(&mut self) -> Result<(), IoError> {
        self.nullary_emitted = true;
        Ok(())
    }
}

#[test]
fn test_read_all_inserts_with_conditions() {
    setup();
    let mut stream = VecReadStream {
        rows: vec![
            (vec![1, 2], "A".to_string()),
            (vec![3, 4], "True".to_string()),
            (vec![1, 2], "B".to_string()),
        ]
        .into_iter(),
    };

    let mut rel = AnyRelation::new(2, false);
    let read = stream.read_all(&mut rel).unwrap();

    assert_eq!(read, 3);
    assert_eq!(rel.len(), 2);
    let merged = rel.as_relation().find(&[1, 2]).unwrap().pc();
    assert_eq!(merged, Pc::parse(r"A \/ B").unwrap());
}

#[test]
fn test_read_all_skips_unparseable_conditions() {
    setup();
    let mut stream = VecReadStream {
        rows: vec![
            (vec![1], "A".to_string()),
            (vec![2], r"A /\ ".to_string()),
            (vec![3], "B".to_string()),
        ]
        .into_iter(),
    };

    let mut rel = AnyRelation::new(1, false);
    stream.read_all(&mut rel).unwrap();

    assert_eq!(rel.len(), 2);
    assert!(rel.contains(&[1]));
    assert!(!rel.contains(&[2]));
    assert!(rel.contains(&[3]));
}

#[test]
fn test_write_all_round_trips_conditions() {
    setup();
    let mut rel = Relation::new(2);
    rel.insert(&[1, 2], Pc::parse("A").unwrap());
    rel.insert(&[3, 4], Pc::TRUE);

    let mut out = VecWriteStream::default();
    out.write_all(&rel).unwrap();

    assert_eq!(out.rows.len(), 2);
    assert!(!out.nullary_emitted);

    // Emitted conditions re-parse to the same interned handles.
    for (fields, text) in &out.rows {
        let reparsed = Pc::parse(text).expect("emitted condition parses");
        assert_eq!(rel.find(fields).unwrap().pc(), reparsed);
    }
}

#[test]
fn test_write_all_nullary() {
    setup();
    let mut rel = Relation::new(0);

    let mut out = VecWriteStream::default();
    out.write_all(&rel).unwrap();
    assert!(!out.nullary_emitted);

    rel.insert(&[], Pc::TRUE);
    let mut out = VecWriteStream::default();
    out.write_all(&rel).unwrap();
    assert!(out.nullary_emitted);
    assert!(out.rows.is_empty());
}

struct VecReadFactory;

impl ReadStreamFactory for VecReadFactory {
    fn name(&self) -> &str {
        "vec"
    }

    fn open(
        &self,
        directives: &IoDirectives,
        _mask: &SymbolMask,
    ) -> Result<Box<dyn TupleReadStream>, IoError> {
        // A real factory would open the file named by the directives; this
        // one synthesises rows from a directive to keep the test hermetic.
        let n: Val = directives
            .get("rows")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| IoError::Malformed("missing rows directive".into()))?;
        let rows = (0..n).map(|i| (vec![i], "True".to_string())).collect::<Vec<_>>();
        Ok(Box::new(VecReadStream { rows: rows.into_iter() }))
    }
}

#[test]
fn test_registry_resolves_by_io_name() {
    setup();
    let mut registry = StreamRegistry::new();
    registry.register_reader(Box::new(VecReadFactory));

    let mut directives = IoDirectives::new();
    directives.set("IO", "vec").set("rows", "3");

    let mut stream = registry
        .reader(&directives, &SymbolMask::numeric(1))
        .unwrap();
    let mut rel = AnyRelation::new(1, false);
    stream.read_all(&mut rel).unwrap();
    assert_eq!(rel.len(), 3);

    // Unknown names are reported, not panicked on.
    let mut unknown = IoDirectives::new();
    unknown.set("IO", "sqlite");
    assert!(matches!(
        registry.reader(&unknown, &SymbolMask::numeric(1)),
        Err(IoError::UnknownStream(_))
    ));
}
