use std::cell::RefCell;

use gtk::{glib, prelude::*, subclass::prelude::*};

#[derive(Default, glib::Properties)]
#[properties(wrapper_type = super::ScriptItemData)]
pub struct ScriptItemData {
    #[property(get, set)]
    name: RefCell<String>,
    #[property(get, set)]
    path: RefCell<String>,
    #[property(get, set)]
    summary: RefCell<String>,
}

#[glib::object_subclass]
impl ObjectSubclass for ScriptItemData {
    const NAME: &'static str = "ScriptItemData";
    type Type = super::ScriptItemData;
}

#[glib::derived_properties]
impl ObjectImpl for ScriptItemData {}
