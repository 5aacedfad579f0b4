use rowbridge::prelude::*;
use serde_json::json;

fn schema() -> Schema {
    Schema::new(vec![
        ObjectTypeDescriptor::new(
            "Account",
            vec![
                PropertyDescriptor::new("number", PrimitiveKind::String).primary_key(),
                PropertyDescriptor::new("balance", PrimitiveKind::Int),
                PropertyDescriptor::new("history", PropertyKind::list("Entry")),
            ],
        ),
        ObjectTypeDescriptor::new(
            "Entry",
            vec![
                PropertyDescriptor::new("amount", PrimitiveKind::Int),
                PropertyDescriptor::new("memo", PrimitiveKind::String).optional(),
            ],
        ),
    ])
    .unwrap()
}

#[test]
fn test_failed_write_undoes_updates() {
    let mut session = Session::new(schema());
    let account = session
        .write(|ctx| {
            ctx.realize(&json!({"number": "A-1", "balance": 10}), "Account", RealizeMode::Create)
        })
        .unwrap();

    let err = session
        .write(|ctx| {
            ctx.set_value_by_name(account, "balance", &json!(0))?;
            ctx.set_value_by_name(account, "history", &json!([{"amount": -10}]))?;
            ctx.set_value_by_name(account, "balance", &json!("broke"))
        })
        .unwrap_err();
    assert!(matches!(err, AccessorError::TypeMismatch { .. }));

    let ctx = session.accessor();
    assert_eq!(ctx.get_value_by_name(account, "balance").unwrap(), Dynamic::Int(10));
    let history = ctx.get_value_by_name(account, "history").unwrap();
    assert_eq!(ctx.collections().size(&history).unwrap(), 0);
    assert_eq!(ctx.engine().row_count(1).unwrap(), 0);
}

#[test]
fn test_rolled_back_key_can_be_reused() {
    let mut session = Session::new(schema());
    let err = session
        .write(|ctx| {
            ctx.realize(&json!({"number": "A-1", "balance": 1}), "Account", RealizeMode::Create)?;
            ctx.realize(&json!({"number": "A-2"}), "Account", RealizeMode::Create)
        })
        .unwrap_err();
    assert!(matches!(err, AccessorError::MissingRequiredValue { .. }));
    assert_eq!(session.engine().row_count(0).unwrap(), 0);

    let account = session
        .write(|ctx| {
            ctx.realize(&json!({"number": "A-1", "balance": 5}), "Account", RealizeMode::Create)
        })
        .unwrap();
    assert_eq!(
        session.accessor().resolve_existing("Account", &json!({"number": "A-1"})).unwrap(),
        Some(account)
    );
}

#[test]
fn test_committed_values_are_visible() {
    let mut session = Session::new(schema());
    let (account, balance) = session
        .write(|ctx| {
            let account = ctx.realize(
                &json!({
                    "number": "A-1",
                    "balance": 0,
                    "history": [{"amount": 5, "memo": "opening"}, {"amount": 7}]
                }),
                "Account",
                RealizeMode::Create,
            )?;
            let balance = ctx.property_index("Account", "balance")?;
            ctx.increment(account, balance, 12)?;
            Ok((account, balance))
        })
        .unwrap();

    assert!(!session.engine().in_transaction());
    let ctx = session.accessor();
    assert_eq!(ctx.get_value(account, balance).unwrap(), Dynamic::Int(12));

    let history = ctx.get_value_by_name(account, "history").unwrap();
    let mut memos = Vec::new();
    ctx.collections()
        .enumerate(&history, |_, entry| {
            memos.push(ctx.get_value_by_name(entry.as_row().unwrap(), "memo")?);
            Ok(())
        })
        .unwrap();
    assert_eq!(memos, vec![Dynamic::from("opening"), Dynamic::Null]);
}

#[test]
fn test_resolve_or_create_writes_only_the_key() {
    let mut session = Session::new(schema());
    let mut ctx = session.accessor();
    let input = json!({"number": "A-9", "balance": 3});

    let row = ctx.resolve_or_create("Account", &input, false).unwrap();
    assert_eq!(ctx.get_value_by_name(row, "number").unwrap(), Dynamic::from("A-9"));
    assert_eq!(ctx.get_value_by_name(row, "balance").unwrap(), Dynamic::Int(0));

    assert_eq!(ctx.resolve_or_create("Account", &input, true).unwrap(), row);
    assert!(matches!(
        ctx.resolve_or_create("Account", &input, false),
        Err(AccessorError::DuplicatePrimaryKey { .. })
    ));
    assert_eq!(ctx.resolve_existing("Account", &json!({"balance": 3})).unwrap(), None);
}
