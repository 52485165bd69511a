use arbor_core::{TreeDatum, TreeProperties};
use arbor_render::{DiagramOptions, SvgRenderOptions, TreeDiagram};
use std::path::PathBuf;
use std::sync::Arc;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn fixture(rel: &str) -> String {
    let path = workspace_root().join("fixtures").join(rel);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

fn diagram(tree: &str, props: Option<&str>) -> TreeDiagram {
    let data = TreeDatum::from_json_str(&fixture(tree)).expect("tree fixture");
    let props = match props {
        Some(p) => TreeProperties::from_json_str(&fixture(p)).expect("props fixture"),
        None => TreeProperties::default(),
    };
    TreeDiagram::create(Arc::new(data), props, DiagramOptions::default()).expect("diagram")
}

fn has_class(node: &roxmltree::Node<'_, '_>, class: &str) -> bool {
    node.attribute("class")
        .is_some_and(|c| c.split_whitespace().any(|c| c == class))
}

#[test]
fn svg_is_well_formed_and_mirrors_the_scene() {
    let mut d = diagram("trees/top_a_b.json", None);
    d.settle();
    let svg = d.to_svg();
    let doc = roxmltree::Document::parse(&svg).expect("svg parses");

    let root = doc.root_element();
    assert_eq!(root.tag_name().name(), "svg");
    assert_eq!(root.attribute("width"), Some("700"));
    assert_eq!(root.attribute("viewBox"), Some("0 0 700 700"));

    let tree = root
        .descendants()
        .find(|n| has_class(n, "tree"))
        .expect("tree group");
    assert_eq!(tree.attribute("transform"), Some("translate(20,20) scale(1)"));

    let nodes: Vec<_> = doc.descendants().filter(|n| has_class(n, "node")).collect();
    assert_eq!(nodes.len(), 3);
    let labels: Vec<&str> = doc
        .descendants()
        .filter(|n| n.has_tag_name("text"))
        .filter_map(|n| n.text())
        .collect();
    assert_eq!(labels, ["Top", "A", "B"]);

    let collapsed: Vec<_> = nodes.iter().filter(|n| has_class(n, "collapsed")).collect();
    assert_eq!(collapsed.len(), 1);
    assert_eq!(collapsed[0].attribute("data-name"), Some("A"));

    let links = doc.descendants().filter(|n| has_class(n, "link")).count();
    assert_eq!(links, 2);
}

#[test]
fn exiting_elements_can_be_left_out() {
    let mut d = diagram("trees/top_a_b.json", None);
    d.click_by_name("A").unwrap();
    d.settle();
    d.click_by_name("A").unwrap();

    let with_exiting = d.to_svg();
    let doc = roxmltree::Document::parse(&with_exiting).unwrap();
    assert_eq!(doc.descendants().filter(|n| has_class(n, "exiting")).count(), 1);

    let live_only = d.to_svg_with(&SvgRenderOptions {
        include_exiting: false,
        ..SvgRenderOptions::default()
    });
    let doc = roxmltree::Document::parse(&live_only).unwrap();
    assert_eq!(doc.descendants().filter(|n| has_class(n, "node")).count(), 3);
}

#[test]
fn styled_vertical_corner_diagram() {
    let d = diagram("trees/org.json", Some("props/vertical_corner.json"));
    let svg = d.to_svg();
    let doc = roxmltree::Document::parse(&svg).expect("svg parses");

    // Every link is an orthogonal corner path in vertical orientation.
    let paths: Vec<&str> = doc
        .descendants()
        .filter(|n| has_class(n, "link"))
        .filter_map(|n| n.attribute("d"))
        .collect();
    assert_eq!(paths.len(), 10);
    for d in &paths {
        let commands: String = d.chars().filter(|c| c.is_ascii_alphabetic()).collect();
        assert_eq!(commands, "MVHV", "{d}");
    }

    let shapes = doc
        .descendants()
        .filter(|n| n.has_tag_name("rect") && has_class(n, "shape"))
        .count();
    assert_eq!(shapes, 11);
    let backgrounds = doc
        .descendants()
        .filter(|n| has_class(n, "label-bg"))
        .count();
    assert_eq!(backgrounds, 11);

    // Only "Storage" names an image and there is no default.
    let images: Vec<_> = doc.descendants().filter(|n| n.has_tag_name("image")).collect();
    assert_eq!(images.len(), 1);
    assert_eq!(
        images[0].attribute("href"),
        Some("https://example.com/storage.png")
    );
    let clip_ref = images[0].attribute("clip-path").unwrap();
    let clip_id = clip_ref
        .trim_start_matches("url(#")
        .trim_end_matches(')');
    assert!(
        doc.descendants()
            .any(|n| n.has_tag_name("clipPath") && n.attribute("id") == Some(clip_id))
    );

    let anchors: Vec<_> = doc.descendants().filter(|n| n.has_tag_name("a")).collect();
    assert_eq!(anchors.len(), 1);
    assert_eq!(
        anchors[0].attribute("href"),
        Some("https://example.com/platform")
    );

    let labels: Vec<&str> = doc
        .descendants()
        .filter(|n| n.has_tag_name("text"))
        .filter_map(|n| n.text())
        .collect();
    assert!(labels.contains(&"Net & Edge"));
    let mobile = labels
        .iter()
        .find(|l| l.starts_with("Mobile"))
        .expect("mobile label");
    assert!(mobile.ends_with("..."), "{mobile}");
}
