use chrono::{TimeZone, Utc};
use rowbridge::prelude::*;
use rowbridge::DbError;
use serde_json::json;

fn schema() -> Schema {
    Schema::new(vec![
        ObjectTypeDescriptor::new(
            "Gadget",
            vec![
                PropertyDescriptor::new("serial", PrimitiveKind::String).primary_key(),
                PropertyDescriptor::new("count", PrimitiveKind::Int),
                PropertyDescriptor::new("score", PrimitiveKind::Double),
                PropertyDescriptor::new("level", PrimitiveKind::Float),
                PropertyDescriptor::new("active", PrimitiveKind::Bool),
                PropertyDescriptor::new("seen", PrimitiveKind::Timestamp),
                PropertyDescriptor::new("blob", PrimitiveKind::Binary).optional(),
                PropertyDescriptor::new("limit", PrimitiveKind::Int).optional(),
                PropertyDescriptor::new("extra", PrimitiveKind::Any),
                PropertyDescriptor::new("owner", PropertyKind::object("Owner")),
            ],
        ),
        ObjectTypeDescriptor::new(
            "Owner",
            vec![PropertyDescriptor::new("name", PrimitiveKind::String)],
        ),
    ])
    .unwrap()
}

fn gadget(serial: &str) -> serde_json::Value {
    json!({
        "serial": serial,
        "count": 1,
        "score": 2.5,
        "level": 0.5,
        "active": true,
        "seen": "2024-01-01T00:00:00Z"
    })
}

fn session_with_gadget() -> (Session, RowHandle) {
    let mut session = Session::new(schema());
    let row = session
        .write(|ctx| ctx.realize(&gadget("g1"), "Gadget", RealizeMode::Create))
        .unwrap();
    (session, row)
}

#[test]
fn test_primitive_round_trip() {
    let (mut session, row) = session_with_gadget();
    let mut ctx = session.accessor();

    assert_eq!(ctx.get_value_by_name(row, "serial").unwrap(), Dynamic::from("g1"));
    assert_eq!(ctx.get_value_by_name(row, "count").unwrap(), Dynamic::Int(1));
    assert_eq!(ctx.get_value_by_name(row, "score").unwrap(), Dynamic::Double(2.5));
    assert_eq!(ctx.get_value_by_name(row, "level").unwrap(), Dynamic::Float(0.5));
    assert_eq!(ctx.get_value_by_name(row, "active").unwrap(), Dynamic::Bool(true));
    assert_eq!(
        ctx.get_value_by_name(row, "seen").unwrap(),
        Dynamic::Timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(ctx.get_value_by_name(row, "blob").unwrap(), Dynamic::Null);
    assert_eq!(ctx.get_value_by_name(row, "owner").unwrap(), Dynamic::Null);

    ctx.set_value_by_name(row, "blob", &Dynamic::Binary(vec![1, 2, 3]))
        .unwrap();
    assert_eq!(
        ctx.get_value_by_name(row, "blob").unwrap(),
        Dynamic::Binary(vec![1, 2, 3])
    );
}

#[test]
fn test_numeric_widening_and_narrowing() {
    let (mut session, row) = session_with_gadget();
    let mut ctx = session.accessor();

    ctx.set_value_by_name(row, "count", &json!(4.0)).unwrap();
    assert_eq!(ctx.get_value_by_name(row, "count").unwrap(), Dynamic::Int(4));

    ctx.set_value_by_name(row, "score", &Dynamic::Int(3)).unwrap();
    assert_eq!(ctx.get_value_by_name(row, "score").unwrap(), Dynamic::Double(3.0));

    let err = ctx.set_value_by_name(row, "count", &json!(4.5)).unwrap_err();
    assert!(matches!(err, AccessorError::TypeMismatch { .. }));
    assert_eq!(ctx.get_value_by_name(row, "count").unwrap(), Dynamic::Int(4));

    let err = ctx.set_value_by_name(row, "active", &json!("yes")).unwrap_err();
    assert!(matches!(err, AccessorError::TypeMismatch { .. }));
}

#[test]
fn test_lossy_integer_coercion_is_opt_in() {
    let mut session = Session::new(schema())
        .with_config(AccessorConfig::default().lossy_integer_coercion(true));
    let row = session
        .write(|ctx| ctx.realize(&gadget("g1"), "Gadget", RealizeMode::Create))
        .unwrap();
    let mut ctx = session.accessor();
    ctx.set_value_by_name(row, "count", &json!(7.9)).unwrap();
    assert_eq!(ctx.get_value_by_name(row, "count").unwrap(), Dynamic::Int(7));
}

#[test]
fn test_null_only_for_optional_properties() {
    let (mut session, row) = session_with_gadget();
    let mut ctx = session.accessor();

    let err = ctx.set_value_by_name(row, "count", &Dynamic::Null).unwrap_err();
    match err {
        AccessorError::TypeMismatch { target, expected, found } => {
            assert_eq!(target, "Gadget.count");
            assert_eq!(expected, "int");
            assert_eq!(found, "null");
        }
        other => panic!("expected type mismatch, got {:?}", other),
    }
    assert_eq!(ctx.get_value_by_name(row, "count").unwrap(), Dynamic::Int(1));

    ctx.set_value_by_name(row, "limit", &json!(5)).unwrap();
    ctx.set_value_by_name(row, "limit", &json!(null)).unwrap();
    assert_eq!(ctx.get_value_by_name(row, "limit").unwrap(), Dynamic::Null);
}

#[test]
#[should_panic(expected = "out of range")]
fn test_property_index_past_end_panics() {
    let (mut session, row) = session_with_gadget();
    let _ = session.accessor().get_value(row, 10);
}

#[test]
fn test_lookup_by_name() {
    let (mut session, row) = session_with_gadget();
    let ctx = session.accessor();
    assert_eq!(ctx.property_index("Gadget", "limit").unwrap(), 7);
    assert!(matches!(
        ctx.property_index("Gadget", "colour"),
        Err(AccessorError::UnknownProperty { .. })
    ));
    assert!(matches!(
        ctx.get_value_by_name(row, "colour"),
        Err(AccessorError::UnknownProperty { .. })
    ));
}

#[test]
fn test_any_properties_are_unsupported() {
    let (mut session, row) = session_with_gadget();
    let mut ctx = session.accessor();
    assert!(matches!(
        ctx.get_value_by_name(row, "extra"),
        Err(AccessorError::UnsupportedConversion(_))
    ));
    assert!(matches!(
        ctx.set_value_by_name(row, "extra", &Dynamic::Int(1)),
        Err(AccessorError::UnsupportedConversion(_))
    ));
}

#[test]
fn test_primary_key_cannot_change() {
    let (mut session, row) = session_with_gadget();
    let mut ctx = session.accessor();
    ctx.set_value_by_name(row, "serial", &json!("g1")).unwrap();
    assert!(matches!(
        ctx.set_value_by_name(row, "serial", &json!("g2")),
        Err(AccessorError::PrimaryKeyImmutable { .. })
    ));
    assert_eq!(ctx.get_value_by_name(row, "serial").unwrap(), Dynamic::from("g1"));
}

#[test]
fn test_increment() {
    let (mut session, row) = session_with_gadget();
    let mut ctx = session.accessor();
    let count = ctx.property_index("Gadget", "count").unwrap();

    assert_eq!(ctx.increment(row, count, 5).unwrap(), 6);
    assert_eq!(ctx.increment(row, count, -2).unwrap(), 4);
    assert_eq!(ctx.get_value(row, count).unwrap(), Dynamic::Int(4));

    let limit = ctx.property_index("Gadget", "limit").unwrap();
    assert!(matches!(
        ctx.increment(row, limit, 1),
        Err(AccessorError::TypeMismatch { .. })
    ));
    let score = ctx.property_index("Gadget", "score").unwrap();
    assert!(matches!(
        ctx.increment(row, score, 1),
        Err(AccessorError::TypeMismatch { .. })
    ));
}

#[test]
fn test_link_property_writes() {
    let (mut session, row) = session_with_gadget();
    let mut ctx = session.accessor();

    ctx.set_value_by_name(row, "owner", &json!({"name": "Olga"}))
        .unwrap();
    let owner = ctx.get_value_by_name(row, "owner").unwrap().as_object().unwrap();
    assert_eq!(ctx.get_value_by_name(owner, "name").unwrap(), Dynamic::from("Olga"));

    let err = ctx
        .set_value_by_name(row, "owner", &Dynamic::Object(row))
        .unwrap_err();
    assert!(matches!(err, AccessorError::TypeMismatch { ref target, .. } if target == "Owner"));

    let err = ctx.set_value_by_name(row, "owner", &json!("Olga")).unwrap_err();
    assert!(
        matches!(err, AccessorError::TypeMismatch { ref target, .. } if target == "Gadget.owner")
    );
    assert_eq!(
        ctx.get_value_by_name(row, "owner").unwrap(),
        Dynamic::Object(owner)
    );

    ctx.set_value_by_name(row, "owner", &Dynamic::Null).unwrap();
    assert_eq!(ctx.get_value_by_name(row, "owner").unwrap(), Dynamic::Null);
}

#[test]
fn test_objects_view_is_lazy() {
    let (mut session, _) = session_with_gadget();
    let mut ctx = session.accessor();
    let all = ctx.objects("Gadget").unwrap();
    assert_eq!(ctx.collections().size(&all).unwrap(), 1);

    ctx.realize(&gadget("g2"), "Gadget", RealizeMode::Create)
        .unwrap();
    assert_eq!(ctx.collections().size(&all).unwrap(), 2);
    assert!(matches!(
        ctx.objects("Nope"),
        Err(AccessorError::UnknownObjectType(_))
    ));
}

#[test]
fn test_dead_row_is_a_storage_failure() {
    let mut session = Session::new(schema());
    let err = session
        .accessor()
        .get_value(RowHandle::new(0, 99), 1)
        .unwrap_err();
    assert!(matches!(
        err,
        AccessorError::StorageEngineFailure(DbError::RowNotFound { row: 99, .. })
    ));
}
