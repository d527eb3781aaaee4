//! Integration tests for the view lifecycle
//!
//! These tests verify that:
//! - Regions resolve through selectors, resolvers or nothing at all
//! - Region lookups fail with stable codes
//! - Destroy frees the element, tears down regions and releases bindings
//! - Destroy is safe before render and when repeated

use lumen_core::{Observable, Value};
use lumen_view::{Bind, Dom, RegionSelector, Template, View, ViewErrorKind};

fn paragraph(dom: &Dom) -> View {
    let view = View::new(dom);
    view.set_template(
        Template::new("p")
            .child(Template::new("span"))
            .child(Template::new("strong")),
    )
    .unwrap();
    view
}

#[test]
fn test_regions_with_string_selectors() {
    let dom = Dom::new();
    let view = paragraph(&dom);
    view.register("x", RegionSelector::css("span"), false).unwrap();
    view.register("y", RegionSelector::css("strong"), false).unwrap();

    let el = view.render().unwrap();
    let children = dom.children(el);
    assert_eq!(view.region_element("x"), Some(children[0]));
    assert_eq!(view.region_element("y"), Some(children[1]));
}

#[test]
fn test_regions_with_resolvers() {
    let dom = Dom::new();
    let view = paragraph(&dom);
    view.register(
        "x",
        RegionSelector::resolver(|dom, el| dom.children(el).first().copied()),
        false,
    )
    .unwrap();
    view.register("self", RegionSelector::resolver(|_, el| Some(el)), false)
        .unwrap();

    let el = view.render().unwrap();
    assert_eq!(view.region_element("x"), dom.children(el).first().copied());
    assert_eq!(view.region_element("self"), Some(el));
}

#[test]
fn test_detached_regions_have_no_element() {
    let dom = Dom::new();
    let view = paragraph(&dom);
    view.register("x", RegionSelector::Detached, false).unwrap();
    view.register("y", RegionSelector::Detached, false).unwrap();
    view.render().unwrap();

    assert_eq!(view.region_element("x"), None);
    assert_eq!(view.region_element("y"), None);
}

#[test]
fn test_region_error_codes() {
    let dom = Dom::new();
    let view = paragraph(&dom);
    let child = View::new(&dom);

    let codes = [
        view.register("", RegionSelector::Detached, false).unwrap_err().code(),
        view.register("x", RegionSelector::css("..."), false).unwrap_err().code(),
        view.add_child("", &child, None).unwrap_err().code(),
        view.add_child("nope", &child, None).unwrap_err().code(),
        view.remove_child("", &child).unwrap_err().code(),
        view.remove_child("nope", &child).unwrap_err().code(),
        view.get_child("nope", 0).unwrap_err().code(),
    ];
    assert_eq!(
        codes,
        [
            "ui-view-register-badrname",
            "ui-view-register-badselector",
            "ui-view-addchild-badrname",
            "ui-view-addchild-noreg",
            "ui-view-removechild-badrname",
            "ui-view-removechild-noreg",
            "ui-view-getchild-noreg",
        ]
    );
}

#[test]
fn test_region_override_rules() {
    let dom = Dom::new();
    let view = paragraph(&dom);
    view.register("x", RegionSelector::css("span"), false).unwrap();

    let err = view
        .register("x", RegionSelector::css("strong"), false)
        .unwrap_err();
    assert_eq!(err.code(), "ui-view-register-override");
    assert_eq!(err.kind(), ViewErrorKind::RegionOverride);

    let child = View::new(&dom);
    view.add_child("x", &child, None).unwrap();
    view.register("x", RegionSelector::css("span"), true).unwrap();
    assert_eq!(view.region_views("x"), vec![child.clone()]);

    view.register("x", RegionSelector::css("strong"), true).unwrap();
    assert_eq!(view.region_views("x"), vec![child]);
    assert_eq!(view.region_names(), vec!["x".to_string()]);
}

#[test]
fn test_destroy_detaches_element() {
    let dom = Dom::new();
    let host = dom.create_element("div");
    let view = paragraph(&dom);
    let el = view.render().unwrap();
    dom.append_child(host, el).unwrap();

    view.destroy();
    assert_eq!(dom.parent(el), None);
    assert!(!dom.exists(el));
    assert!(dom.children(host).is_empty());
    assert!(view.is_destroyed());
    assert_eq!(view.render().unwrap_err().code(), "ui-view-destroyed");
}

#[test]
fn test_destroy_destroys_region_children() {
    let dom = Dom::new();
    let view = paragraph(&dom);
    view.register("x", RegionSelector::Detached, false).unwrap();
    let child = View::new(&dom);
    view.add_child("x", &child, None).unwrap();

    view.destroy();
    assert!(child.is_destroyed());
    assert!(view.region_names().is_empty());
}

#[test]
fn test_destroy_detaches_bound_model_listeners() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let dom = Dom::new();
    let model = Observable::with_attributes([("foo", Value::from("bar"))]);
    let view = View::with_model(&dom, &model);
    view.set_template(Template::new("p").text(Bind::to("foo")))
        .unwrap();
    let el = view.render().unwrap();
    assert_eq!(dom.outer_html(el), "<p>bar</p>");

    model.set("foo", "baz").unwrap();
    assert_eq!(dom.outer_html(el), "<p>baz</p>");

    view.destroy();
    model.set("foo", "abc").unwrap();
    assert!(!dom.exists(el));
    assert_eq!(model.emitter().listener_count("change:foo"), 0);
}

#[test]
fn test_destroy_frees_dom_nodes() {
    let dom = Dom::new();
    let host = dom.create_element("div");
    let baseline = dom.len();

    for _ in 0..100 {
        let view = View::new(&dom);
        view.set_template(Template::new("p").child(Template::new("span")))
            .unwrap();
        let el = view.render().unwrap();
        dom.append_child(host, el).unwrap();
        view.destroy();
        view.destroy();
    }
    assert_eq!(dom.len(), baseline);
    assert_eq!(dom.child_count(host), 0);
}

#[test]
fn test_destroy_templateless_view() {
    let dom = Dom::new();
    let view = View::new(&dom);
    view.destroy();
    view.destroy();
    assert!(view.is_destroyed());
    assert_eq!(view.element(), None);
}

#[test]
fn test_destroy_keeps_shared_model_alive() {
    let dom = Dom::new();
    let model = Observable::with_attributes([("a", Value::from(1))]);
    let source = Observable::with_attributes([("a", Value::from(2))]);
    model.bind(&["a"]).unwrap().to(&source, &[]).unwrap();

    let view = View::with_model(&dom, &model);
    view.destroy();

    source.set("a", 3).unwrap();
    assert_eq!(model.get("a"), Value::from(3));
}
