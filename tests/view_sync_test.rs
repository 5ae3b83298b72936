use anyhow::Result;
use form_binder::adapters::memory_view::{Element, ElementKind};
use form_binder::core::{ChangeEvent, ChannelEvent, ElementId, Origin};
use form_binder::{BindingSession, EventChannel, MemoryView, SessionId, ViewSync};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

struct Form {
    channel: EventChannel,
    view: Rc<RefCell<MemoryView>>,
    sync: ViewSync<MemoryView>,
}

fn profile_form(id: &str) -> Result<Form> {
    let channel = EventChannel::new(SessionId::new(id)?);
    let view = Rc::new(RefCell::new(MemoryView::new(vec![
        Element::new(ElementKind::Input).named("firstName"),
        Element::new(ElementKind::Textarea).named("lastName"),
        Element::new(ElementKind::Other).with_id("_fullName"),
        Element::new(ElementKind::Checkbox).named("newsletter").with_value("true"),
    ])));
    let sync = ViewSync::attach(&channel, Rc::clone(&view));
    Ok(Form { channel, view, sync })
}

fn element(form: &Form, index: usize) -> Element {
    form.view.borrow().elements()[index].clone()
}

#[test]
fn test_load_tags_and_paints_elements() -> Result<()> {
    let form = profile_form("profile")?;
    let session = BindingSession::bind(
        &form.channel,
        &json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "newsletter": true,
            "_fullName": "Hello {firstName} {lastName}",
        }),
        &form.sync,
    )?;

    assert!(session.load_report().skipped.is_empty());
    assert_eq!(form.sync.attribute(), "form-binder-profile");
    assert_eq!(
        form.sync.bound_property(ElementId(2)).as_deref(),
        Some("_fullName")
    );

    assert_eq!(element(&form, 0).value, "Jane");
    assert_eq!(element(&form, 1).value, "Doe");
    assert_eq!(element(&form, 2).text, "Hello Jane Doe");
    assert!(element(&form, 3).checked);
    Ok(())
}

#[test]
fn test_view_edit_updates_model_and_calculated_elements() -> Result<()> {
    let form = profile_form("edit")?;
    let session = BindingSession::bind(
        &form.channel,
        &json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "_fullName": "Hello {firstName} {lastName}",
        }),
        &form.sync,
    )?;

    let updates = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&updates);
    session.on_updated(move || *counter.borrow_mut() += 1);

    let input = form.sync.locate("firstName").expect("input is present");
    form.view.borrow_mut().type_into(input, "Joan");
    assert!(form.sync.edited(input, "Joan"));

    assert_eq!(session.get("firstName"), Some(json!("Joan")));
    assert_eq!(session.get_calculated("_fullName").as_deref(), Some("Hello Joan Doe"));
    assert_eq!(element(&form, 2).text, "Hello Joan Doe");
    assert_eq!(*updates.borrow(), 1);
    Ok(())
}

#[test]
fn test_model_set_paints_view() -> Result<()> {
    let form = profile_form("paint")?;
    let session = BindingSession::bind(
        &form.channel,
        &json!({"firstName": "Jane", "newsletter": true}),
        &form.sync,
    )?;

    session.set("firstName", "Kari")?;
    session.set("newsletter", false)?;

    assert_eq!(element(&form, 0).value, "Kari");
    assert!(!element(&form, 3).checked);
    Ok(())
}

#[test]
fn test_missing_element_is_skipped_but_value_kept() -> Result<()> {
    let form = profile_form("partial")?;
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _log = form
        .channel
        .on_change(move |change| sink.borrow_mut().push(change.property.clone()));

    let session = BindingSession::bind(
        &form.channel,
        &json!({"firstName": "Jane", "nickname": "JJ"}),
        &form.sync,
    )?;

    assert_eq!(session.load_report().linked, vec!["firstName"]);
    assert_eq!(session.load_report().skipped, vec!["nickname"]);
    assert_eq!(session.get("nickname"), Some(json!("JJ")));
    assert_eq!(*seen.borrow(), vec!["firstName"]);
    Ok(())
}

#[test]
fn test_calculated_element_sees_values_of_unbound_entries() -> Result<()> {
    let channel = EventChannel::new(SessionId::new("greet")?);
    let view = Rc::new(RefCell::new(MemoryView::new(vec![
        Element::new(ElementKind::Other).with_id("_greet"),
    ])));
    let sync = ViewSync::attach(&channel, Rc::clone(&view));

    let session = BindingSession::bind(
        &channel,
        &json!({"_greet": "Hi {nick}", "nick": "JJ"}),
        &sync,
    )?;

    assert_eq!(session.load_report().skipped, vec!["nick"]);
    assert_eq!(session.get_calculated("_greet").as_deref(), Some("Hi JJ"));
    assert_eq!(view.borrow().elements()[0].text, "Hi JJ");

    session.set("nick", "Jay")?;
    assert_eq!(view.borrow().elements()[0].text, "Hi Jay");
    Ok(())
}

#[test]
fn test_replace_model_links_through_the_view() -> Result<()> {
    let channel = EventChannel::new(SessionId::new("swap")?);
    let view = Rc::new(RefCell::new(MemoryView::new(vec![
        Element::new(ElementKind::Input).named("city"),
    ])));
    let sync = ViewSync::attach(&channel, Rc::clone(&view));
    let session = BindingSession::bind(&channel, &json!({}), &sync)?;

    let report = session.replace_model(&json!({"city": "Oslo", "ghost": 1}), &sync)?;

    assert_eq!(report.linked, vec!["city"]);
    assert_eq!(report.skipped, vec!["ghost"]);
    assert_eq!(session.load_report(), report);
    assert_eq!(session.get("ghost"), Some(json!(1)));

    let city = sync.locate("city").expect("city input");
    assert_eq!(view.borrow().elements()[0].value, "Oslo");
    assert_eq!(sync.bound_property(city).as_deref(), Some("city"));

    view.borrow_mut().type_into(city, "Bergen");
    assert!(sync.edited(city, "Bergen"));
    assert_eq!(session.get("city"), Some(json!("Bergen")));
    Ok(())
}

#[test]
fn test_echoed_model_change_is_not_reapplied() -> Result<()> {
    let form = profile_form("echo")?;
    let session = BindingSession::bind(&form.channel, &json!({"firstName": "Jane"}), &form.sync)?;

    let captured = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&captured);
    let _capture = form
        .channel
        .on_change_from(Origin::Model, move |change| sink.borrow_mut().push(change.clone()));

    session.set("firstName", "Joan")?;
    let revision = session.revision();

    let echoes: Vec<ChangeEvent> = captured.borrow().clone();
    assert_eq!(echoes.len(), 1);
    for echo in echoes {
        form.channel.publish(ChannelEvent::Change(echo));
    }

    assert_eq!(session.revision(), revision);
    assert_eq!(session.get("firstName"), Some(json!("Joan")));
    Ok(())
}

#[test]
fn test_edit_of_unbound_element_is_ignored() -> Result<()> {
    let form = profile_form("unbound")?;
    let session = BindingSession::bind(&form.channel, &json!({"firstName": "Jane"}), &form.sync)?;

    let textarea = form.sync.locate("lastName").expect("textarea is present");
    assert!(!form.sync.edited(textarea, "Doe"));
    assert!(session.get("lastName").is_none());
    Ok(())
}

#[test]
fn test_two_sessions_share_a_view_without_crosstalk() -> Result<()> {
    let view = Rc::new(RefCell::new(MemoryView::new(vec![
        Element::new(ElementKind::Input).named("title"),
        Element::new(ElementKind::Input).named("count"),
    ])));

    let left = EventChannel::new(SessionId::new("left")?);
    let left_sync = ViewSync::attach(&left, Rc::clone(&view));
    let left_session = BindingSession::bind(&left, &json!({"title": "L"}), &left_sync)?;

    let right = EventChannel::new(SessionId::new("right")?);
    let right_sync = ViewSync::attach(&right, Rc::clone(&view));
    let right_session = BindingSession::bind(&right, &json!({"count": 1}), &right_sync)?;

    left_session.set("title", "Left title")?;
    right_session.set("count", 2)?;

    let elements = view.borrow().elements().to_vec();
    assert_eq!(elements[0].value, "Left title");
    assert_eq!(elements[1].value, "2");

    let count = right_sync.locate("count").expect("count input");
    assert!(!left_sync.edited(count, "9"));
    assert!(right_sync.edited(count, "9"));
    assert_eq!(right_session.get("count"), Some(json!("9")));
    assert!(left_session.get("count").is_none());
    Ok(())
}

#[test]
fn test_dispose_stops_painting() -> Result<()> {
    let form = profile_form("disposed")?;
    let session = BindingSession::bind(&form.channel, &json!({"firstName": "Jane"}), &form.sync)?;

    session.dispose();
    session.set("firstName", "Later")?;

    assert_eq!(element(&form, 0).value, "Jane");
    assert_eq!(form.channel.listener_count(), 0);
    Ok(())
}
