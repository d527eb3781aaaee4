//! Integration tests for template rendering through views
//!
//! These tests verify that:
//! - Attribute and text bindings follow the view model
//! - Text bindings replace the whole element content
//! - DOM events are re-emitted on the model, with selector filtering
//! - Delegated listeners see elements added after render

use std::cell::RefCell;
use std::rc::Rc;

use lumen_core::Value;
use lumen_view::{Bind, Dom, DomEventInfo, NodeId, Template, View};

type Log = Rc<RefCell<Vec<(String, NodeId)>>>;

fn view_with(dom: &Dom, attributes: &[(&str, Value)], template: Template) -> View {
    let view = View::with_attributes(
        dom,
        attributes.iter().map(|(k, v)| (k.to_string(), v.clone())),
    );
    view.set_template(template).unwrap();
    view.render().unwrap();
    view
}

fn record(view: &View, event: &str, log: &Log) {
    let log = log.clone();
    view.on(event, move |info, args| {
        let target = args[0]
            .downcast_ref::<DomEventInfo>()
            .map(|payload| payload.target)
            .unwrap();
        log.borrow_mut().push((info.name.clone(), target));
    });
}

#[test]
fn test_attribute_binding() {
    let dom = Dom::new();
    let view = view_with(
        &dom,
        &[("foo", Value::from("bar"))],
        Template::new("p").attr("class", Bind::to("foo")).text("abc"),
    );
    let el = view.element().unwrap();
    assert_eq!(dom.outer_html(el), "<p class=\"bar\">abc</p>");

    view.set("foo", "baz").unwrap();
    assert_eq!(dom.outer_html(el), "<p class=\"baz\">abc</p>");
}

#[test]
fn test_text_binding_replaces_children() {
    let dom = Dom::new();
    let view = view_with(
        &dom,
        &[("foo", Value::from("bar"))],
        Template::new("p")
            .child(Template::new("b").text("baz"))
            .text(Bind::to("foo")),
    );
    let el = view.element().unwrap();
    assert_eq!(dom.outer_html(el), "<p>bar<b>baz</b></p>");

    view.set("foo", "qux").unwrap();
    assert_eq!(dom.outer_html(el), "<p>qux</p>");
}

#[test]
fn test_binding_with_transform() {
    let sign = |value: &Value| {
        Value::from(if value.as_f64().unwrap_or(0.0) > 0.0 {
            "positive"
        } else {
            "negative"
        })
    };
    let dom = Dom::new();
    let view = view_with(
        &dom,
        &[("foo", Value::from(3))],
        Template::new("p")
            .attr("class", Bind::to_with("foo", sign))
            .text(Bind::to_with("foo", sign)),
    );
    let el = view.element().unwrap();
    assert_eq!(dom.outer_html(el), "<p class=\"positive\">positive</p>");

    view.set("foo", -7).unwrap();
    assert_eq!(dom.outer_html(el), "<p class=\"negative\">negative</p>");
}

#[test]
fn test_transform_can_hide_attribute() {
    let dom = Dom::new();
    let view = view_with(
        &dom,
        &[("foo", Value::from("moo"))],
        Template::new("p")
            .attr(
                "class",
                Bind::to_with("foo", |value| match value.as_str() {
                    Some("changed") => value.clone(),
                    _ => Value::Undefined,
                }),
            )
            .text("bar"),
    );
    let el = view.element().unwrap();
    assert_eq!(dom.outer_html(el), "<p>bar</p>");

    view.set("foo", "changed").unwrap();
    assert_eq!(dom.outer_html(el), "<p class=\"changed\">bar</p>");
}

#[test]
fn test_plain_and_multiple_event_bindings() {
    let dom = Dom::new();
    let view = view_with(&dom, &[], Template::new("p").on("x", "a").on("x", "b"));
    let log: Log = Rc::default();
    record(&view, "a", &log);
    record(&view, "b", &log);

    let el = view.element().unwrap();
    dom.dispatch_event(el, "x");
    assert_eq!(
        *log.borrow(),
        vec![("a".to_string(), el), ("b".to_string(), el)]
    );
}

#[test]
fn test_event_selectors_match_target() {
    let dom = Dom::new();
    let view = view_with(
        &dom,
        &[],
        Template::new("p")
            .child(Template::new("span").attr("class", "y").on("test@p", "c"))
            .child(Template::new("div").child(Template::new("span").attr("class", "y")))
            .on("test@.y", "a")
            .on("test@div", "b"),
    );
    let log: Log = Rc::default();
    for name in ["a", "b", "c"] {
        record(&view, name, &log);
    }

    let el = view.element().unwrap();
    let children = dom.children(el);
    let (first, last) = (children[0], children[1]);
    let nested = dom.children(last)[0];

    dom.dispatch_event(el, "test");
    assert!(log.borrow().is_empty());

    dom.dispatch_event(first, "test");
    assert_eq!(*log.borrow(), vec![("a".to_string(), first)]);

    dom.dispatch_event(last, "test");
    assert_eq!(log.borrow()[1], ("b".to_string(), last));

    dom.dispatch_event(nested, "test");
    assert_eq!(log.borrow()[2], ("a".to_string(), nested));
    assert_eq!(log.borrow().len(), 3);
}

#[test]
fn test_function_callbacks() {
    let dom = Dom::new();
    let targets = Rc::new(RefCell::new(Vec::new()));
    let (t1, t2) = (targets.clone(), targets.clone());
    let view = view_with(
        &dom,
        &[],
        Template::new("p")
            .child(Template::new("span"))
            .on_call("x", move |event| t1.borrow_mut().push(("x", event.target)))
            .on_call("y@span", move |event| t2.borrow_mut().push(("y", event.target)))
            .on("y@span", "c"),
    );
    let log: Log = Rc::default();
    record(&view, "c", &log);

    let el = view.element().unwrap();
    let span = dom.children(el)[0];
    dom.dispatch_event(el, "x");
    dom.dispatch_event(span, "y");

    assert_eq!(*targets.borrow(), vec![("x", el), ("y", span)]);
    assert_eq!(*log.borrow(), vec![("c".to_string(), span)]);
}

#[test]
fn test_delegation_and_future_elements() {
    let dom = Dom::new();
    let view = view_with(
        &dom,
        &[],
        Template::new("p")
            .child(Template::new("span"))
            .on("x", "a")
            .on("test@div", "b"),
    );
    let log: Log = Rc::default();
    record(&view, "a", &log);
    record(&view, "b", &log);

    let el = view.element().unwrap();
    let span = dom.children(el)[0];
    dom.dispatch_event(span, "x");

    let div = dom.create_element("div");
    dom.append_child(el, div).unwrap();
    dom.dispatch_event(div, "test");

    assert_eq!(
        *log.borrow(),
        vec![("a".to_string(), span), ("b".to_string(), div)]
    );
}

#[test]
fn test_collection_placeholder_tracks_membership() {
    let dom = Dom::new();
    let list = View::new(&dom);
    let items = list.create_collection();
    list.set_template(
        Template::new("ul")
            .child(Template::new("li").attr("class", "head"))
            .collection(&items),
    )
    .unwrap();
    let el = list.render().unwrap();

    let item = |label: &str| {
        let view = View::with_attributes(&dom, [("label", Value::from(label))]);
        view.set_template(Template::new("li").text(Bind::to("label")))
            .unwrap();
        view
    };
    let a = item("a");
    let b = item("b");
    items.add(&a).unwrap();
    items.add_at(&b, 0).unwrap();
    assert_eq!(
        dom.inner_html(el),
        "<li class=\"head\"></li><li>b</li><li>a</li>"
    );

    items.remove(&b);
    a.set("label", "z").unwrap();
    assert_eq!(dom.inner_html(el), "<li class=\"head\"></li><li>z</li>");

    list.destroy();
    assert!(a.is_destroyed());
}
