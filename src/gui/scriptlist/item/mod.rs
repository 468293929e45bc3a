use gtk::glib;

mod imp;

glib::wrapper! {
    pub struct ScriptItemData(ObjectSubclass<imp::ScriptItemData>);
}

impl ScriptItemData {
    pub fn new(name: &str, path: &str, summary: &str) -> Self {
        glib::Object::builder()
            .property("name", name)
            .property("path", path)
            .property("summary", summary)
            .build()
    }
}
