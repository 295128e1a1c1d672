use supabase_api::{Direction, Filter, Select};

fn pairs(values: &[(&str, &str)]) -> Vec<(String, String)> {
    values
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

#[test]
fn select_encodes_columns_filters_order_and_limit_in_order() {
    let select = Select::from("messages")
        .columns("content,created_at,user_id,profiles(username)")
        .eq("room_id", "room-1")
        .gt("created_at", "2024-01-15T09:30:00+00:00")
        .order("created_at", Direction::Ascending)
        .limit(20);

    assert_eq!(select.table(), "messages");
    assert_eq!(
        select.query_pairs(),
        pairs(&[
            ("select", "content,created_at,user_id,profiles(username)"),
            ("room_id", "eq.room-1"),
            ("created_at", "gt.2024-01-15T09:30:00+00:00"),
            ("order", "created_at.asc"),
            ("limit", "20"),
        ])
    );
}

#[test]
fn descending_order_uses_desc_suffix() {
    let select = Select::from("messages").order("created_at", Direction::Descending);
    assert_eq!(
        select.query_pairs().last().cloned(),
        Some(("order".to_owned(), "created_at.desc".to_owned()))
    );
}

#[test]
fn in_filter_quotes_each_value() {
    let filter = Filter::in_list("id", ["a1", "b,2"]);
    assert_eq!(filter.column(), "id");
    assert_eq!(filter.expression(), r#"in.("a1","b,2")"#);
}
