use std::path::PathBuf;

use gtk::{
    gio,
    prelude::{Cast, GObjectPropertyExpressionExt, ListItemExt, SelectionModelExt, WidgetExt},
};
use relm4::{ComponentParts, ComponentSender, SimpleComponent};

use crate::{
    gui::util,
    scripts::{self, ScriptEntry},
};

use item::ScriptItemData;

mod item;

/// Input messages for [ScriptList].
#[derive(Debug)]
pub enum Input {
    /// Re-lists the scripts directory.
    Reload,
    // Internal:
    SelectionChanged,
}

/// Output messages for [ScriptList].
#[derive(Debug)]
pub enum Output {
    /// The currently selected script, if any.
    Selected(Option<ScriptEntry>),
    /// Failure to list the scripts directory.
    Error(String),
}

/// Initialisation parameters for [ScriptList].
pub struct Init {
    pub scripts_dir: PathBuf,
}

/// Relm4 component listing the candidate scripts with their declared
/// parameters.
pub struct ScriptList {
    scripts_dir: PathBuf,
    entries: Vec<ScriptEntry>,
    list_model: gio::ListStore,
    selection: gtk::SingleSelection,
    column_view: gtk::ColumnView,
}

impl ScriptList {
    fn selected_entry(&self) -> Option<ScriptEntry> {
        let position = self.selection.selected();
        if position == gtk::INVALID_LIST_POSITION {
            return None;
        }
        self.entries.get(position as usize).cloned()
    }

    fn reload(&mut self, sender: &ComponentSender<Self>) {
        match scripts::list_scripts(&self.scripts_dir) {
            Ok(entries) => {
                self.entries = entries;
                self.list_model.remove_all();
                for entry in &self.entries {
                    self.list_model.append(&ScriptItemData::new(
                        &entry.name,
                        &entry.path.to_string_lossy(),
                        &entry.params_summary(),
                    ));
                }
            }
            Err(err) => {
                self.entries.clear();
                self.list_model.remove_all();
                util::send_output_or_log(
                    Output::Error(format!("Error listing scripts: {:#}", err)),
                    "script listing error",
                    sender,
                );
            }
        }
        // Reloading invalidates any selection.
        util::send_output_or_log(Output::Selected(None), "cleared selection", sender);
    }
}

#[relm4::component(pub)]
impl SimpleComponent for ScriptList {
    type Init = Init;

    type Input = Input;
    type Output = Output;

    view! {
        gtk::ScrolledWindow {
            set_vexpand: true,
            container_add: &model.column_view,
        }
    }

    fn update(&mut self, message: Self::Input, sender: ComponentSender<Self>) {
        match message {
            Input::Reload => {
                self.reload(&sender);
            }
            Input::SelectionChanged => {
                util::send_output_or_log(
                    Output::Selected(self.selected_entry()),
                    "selection",
                    &sender,
                );
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let list_model = gio::ListStore::new::<ScriptItemData>();

        let selection = gtk::SingleSelection::new(Some(list_model.clone()));
        selection.set_autoselect(false);
        selection.set_can_unselect(true);
        {
            let sender = sender.clone();
            selection.connect_selection_changed(move |_, _, _| {
                sender.input(Input::SelectionChanged);
            });
        }

        let column_view = gtk::ColumnView::new(Some(selection.clone()));
        column_view.set_hexpand(true);
        column_view.set_vexpand(true);
        column_view.append_column(&make_column("Script Name", "name"));
        column_view.append_column(&make_column("Script Path", "path"));
        column_view.append_column(&make_column("Required Parameters", "summary"));

        let mut model = Self {
            scripts_dir: init.scripts_dir,
            entries: Vec::new(),
            list_model,
            selection,
            column_view,
        };
        model.reload(&sender);

        let widgets = view_output!();

        ComponentParts { model, widgets }
    }
}

fn make_column(title: &str, property: &'static str) -> gtk::ColumnViewColumn {
    let factory = gtk::SignalListItemFactory::new();
    factory.connect_setup(move |_factory, list_item| {
        let label = gtk::Label::new(None);
        label.set_halign(gtk::Align::Start);
        let list_item = list_item
            .downcast_ref::<gtk::ListItem>()
            .expect("Needs to be ListItem");
        list_item.set_child(Some(&label));

        // Bind `list_item->item-><property>` to `label->label`.
        list_item
            .property_expression("item")
            .chain_property::<ScriptItemData>(property)
            .bind(&label, "label", gtk::Widget::NONE);
    });

    let column = gtk::ColumnViewColumn::new(Some(title), Some(factory));
    column.set_expand(true);
    column
}
