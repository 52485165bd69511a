use crate::TreeDatum;
use serde_json::json;
use std::sync::Arc;


fn top_a_b() -> Arc<TreeDatum> {
    let value = json!({
        "name": "Top",
        "children": [
            { "name": "A", "children": [{ "name": "Son of A" }] },
            { "name": "B" }
        ]
    });
    Arc::new(TreeDatum::from_value(&value).unwrap())
}

/// Root with three children; the first two have two and one children respectively.
fn three_level() -> Arc<TreeDatum> {
    Arc::new(TreeDatum::with_children(
        "r",
        vec![
            TreeDatum::with_children("a", vec![TreeDatum::leaf("a1"), TreeDatum::leaf("a2")]),
            TreeDatum::with_children("b", vec![TreeDatum::leaf("b1")]),
            TreeDatum::leaf("c"),
        ],
    ))
}
