use std::{
    path::PathBuf,
    sync::{Arc, OnceLock},
};

use gtk::prelude::*;
use relm4::{
    Component, ComponentController, ComponentParts, ComponentSender, Controller, RelmWidgetExt,
    SimpleComponent,
};
use relm4_components::{
    open_button::{OpenButton, OpenButtonSettings},
    open_dialog::OpenDialogSettings,
};

use crate::{
    gui::util,
    params::TypeTag,
    preview::{self, Preview},
    scripts::ScriptEntry,
    table::Row,
};

/// String parameter name that receives a file-browse affordance and a
/// bounded preview of the chosen file.
const INPUT_FILE_PARAM: &str = "input_file";

/// Input messages for [ParamsForm].
#[derive(Debug)]
pub enum Input {
    /// Presents the form for the given script's parameters.
    Present(ScriptEntry),
    // Internal:
    FileChosen(usize, PathBuf),
    Submit,
    Cancel,
}

/// Output messages for [ParamsForm].
#[derive(Debug)]
pub enum Output {
    Submitted(Submission),
}

/// Raw values collected for a script, one per declared parameter, in
/// declared order.
#[derive(Debug)]
pub struct Submission {
    pub script: ScriptEntry,
    pub raw_values: Vec<String>,
}

/// Initialisation parameters for [ParamsForm].
pub struct Init {
    pub xdg_dirs: Arc<xdg::BaseDirectories>,
}

/// One input affordance per declared parameter.
enum Field {
    Text { buffer: gtk::EntryBuffer },
    Toggle { button: gtk::CheckButton },
    Unsupported,
}

/// Relm4 window component that collects parameter values for one script
/// invocation.
pub struct ParamsForm {
    xdg_dirs: Arc<xdg::BaseDirectories>,

    hidden: bool,
    script: Option<ScriptEntry>,
    fields: Vec<Field>,
    browse_buttons: Vec<Controller<OpenButton>>,
    preview_error: Option<String>,

    fields_grid: gtk::Grid,
    preview_frame: gtk::Frame,
}

impl ParamsForm {
    fn can_submit(&self) -> bool {
        self.script.is_some()
            && self
                .fields
                .iter()
                .all(|field| !matches!(field, Field::Unsupported))
    }

    /// Rebuilds the per-parameter input rows for `script`.
    fn build_fields(&mut self, script: &ScriptEntry, sender: &ComponentSender<Self>) {
        while let Some(child) = self.fields_grid.first_child() {
            self.fields_grid.remove(&child);
        }
        self.fields.clear();
        self.browse_buttons.clear();

        for (index, spec) in script.params.iter().enumerate() {
            let row = index as i32;
            let label = gtk::Label::new(Some(&format!("Enter {}:", spec.name)));
            label.set_halign(gtk::Align::Start);
            self.fields_grid.attach(&label, 0, row, 1, 1);

            let field = match &spec.type_tag {
                TypeTag::Int | TypeTag::Float => {
                    let buffer = gtk::EntryBuffer::default();
                    let entry = gtk::Entry::with_buffer(&buffer);
                    entry.set_placeholder_text(Some("number"));
                    self.fields_grid.attach(&entry, 1, row, 1, 1);
                    Field::Text { buffer }
                }
                TypeTag::Str => {
                    let buffer = gtk::EntryBuffer::default();
                    let entry = gtk::Entry::with_buffer(&buffer);
                    self.fields_grid.attach(&entry, 1, row, 1, 1);
                    if spec.name == INPUT_FILE_PARAM {
                        entry.set_placeholder_text(Some("path to a .csv or .xlsx file"));
                        let browse = self.make_browse_button(index, sender);
                        self.fields_grid.attach(browse.widget(), 2, row, 1, 1);
                        self.browse_buttons.push(browse);
                    }
                    Field::Text { buffer }
                }
                TypeTag::Bool => {
                    let button = gtk::CheckButton::with_label(&spec.name);
                    self.fields_grid.attach(&button, 1, row, 1, 1);
                    Field::Toggle { button }
                }
                TypeTag::Other(tag) => {
                    let marker = gtk::Label::new(Some(&format!(
                        "Invalid parameter type: {}. Please contact technical support.",
                        tag
                    )));
                    marker.set_halign(gtk::Align::Start);
                    marker.add_css_class("error-label");
                    self.fields_grid.attach(&marker, 1, row, 1, 1);
                    Field::Unsupported
                }
            };
            self.fields.push(field);
        }
    }

    fn make_browse_button(
        &self,
        index: usize,
        sender: &ComponentSender<Self>,
    ) -> Controller<OpenButton> {
        // The underlying path string is leaked to satisfy the 'static
        // bound, so resolve it once rather than on every form build.
        static RECENT_INPUT_FILES: OnceLock<Option<&'static str>> = OnceLock::new();
        let recent_input_files = *RECENT_INPUT_FILES
            .get_or_init(|| util::xdg_cfg_static_str(&self.xdg_dirs, "recent_input_files.txt"));

        let tabular_filter = gtk::FileFilter::new();
        tabular_filter.set_name(Some("Tabular file"));
        tabular_filter.add_pattern("*.csv");
        tabular_filter.add_pattern("*.xlsx");

        OpenButton::builder()
            .launch(OpenButtonSettings {
                dialog_settings: OpenDialogSettings {
                    folder_mode: false,
                    cancel_label: "Cancel".to_string(),
                    accept_label: "Open".to_string(),
                    create_folders: false,
                    is_modal: true,
                    filters: vec![tabular_filter],
                },
                icon: None,
                text: "Browse",
                recently_opened_files: recent_input_files,
                max_recent_files: 10,
            })
            .forward(sender.input_sender(), move |path| {
                Input::FileChosen(index, path)
            })
    }

    fn set_preview(&mut self, preview: Option<&Preview>) {
        match preview {
            None => {
                self.preview_frame.set_child(gtk::Widget::NONE);
                self.preview_frame.set_visible(false);
            }
            Some(preview) => {
                let grid = gtk::Grid::new();
                grid.set_margin_all(5);
                grid.set_column_spacing(10);
                grid.set_row_spacing(2);

                attach_preview_row(&grid, 0, &preview.header, true);
                for (index, row) in preview.rows.iter().enumerate() {
                    attach_preview_row(&grid, index as i32 + 1, row, false);
                }

                let scrolled = gtk::ScrolledWindow::new();
                scrolled.set_min_content_height(150);
                scrolled.set_child(Some(&grid));

                self.preview_frame.set_child(Some(&scrolled));
                self.preview_frame.set_visible(true);
            }
        }
    }
}

fn attach_preview_row(grid: &gtk::Grid, row: i32, cells: &Row, header: bool) {
    for (column, cell) in cells.iter().enumerate() {
        let label = gtk::Label::new(Some(cell.as_str()));
        label.set_halign(gtk::Align::Start);
        if header {
            label.add_css_class("preview-header");
        }
        grid.attach(&label, column as i32, row, 1, 1);
    }
}

#[relm4::component(pub)]
impl SimpleComponent for ParamsForm {
    type Init = Init;

    type Input = Input;
    type Output = Output;

    view! {
        gtk::Window {
            set_title: Some("Enter Script Parameters"),
            set_modal: true,
            set_hide_on_close: true,
            #[watch]
            set_visible: !model.hidden,

            gtk::Box {
                set_orientation: gtk::Orientation::Vertical,
                set_spacing: 5,
                set_margin_all: 5,

                #[local_ref]
                fields_grid -> gtk::Grid {
                    set_column_spacing: 5,
                    set_row_spacing: 5,
                },

                #[local_ref]
                preview_frame -> gtk::Frame {
                    set_label: Some("Input file preview"),
                    set_visible: false,
                },

                gtk::Label {
                    #[watch]
                    set_label: model.preview_error.as_deref().unwrap_or_default(),
                    #[watch]
                    set_visible: model.preview_error.is_some(),
                    add_css_class: "error-label",
                    set_halign: gtk::Align::Start,
                },

                gtk::Box {
                    set_orientation: gtk::Orientation::Horizontal,
                    set_spacing: 5,
                    set_halign: gtk::Align::End,

                    gtk::Button::with_label("Cancel") {
                        connect_clicked[sender] => move |_| {
                            sender.input(Input::Cancel);
                        },
                    },
                    gtk::Button::with_label("Run") {
                        #[watch]
                        set_sensitive: model.can_submit(),
                        connect_clicked[sender] => move |_| {
                            sender.input(Input::Submit);
                        },
                    },
                },
            }
        }
    }

    fn update(&mut self, message: Self::Input, sender: ComponentSender<Self>) {
        match message {
            Input::Present(script) => {
                self.build_fields(&script, &sender);
                self.script = Some(script);
                self.preview_error = None;
                self.set_preview(None);
                self.hidden = false;
            }
            Input::FileChosen(index, path) => {
                match self.fields.get(index) {
                    Some(Field::Text { buffer }) => {
                        buffer.set_text(path.to_string_lossy().as_ref());
                    }
                    _ => {
                        log::warn!("File chosen for field {} which is not a text entry.", index);
                        return;
                    }
                }
                match preview::preview_file(&path) {
                    Ok(preview) => {
                        self.preview_error = None;
                        self.set_preview(Some(&preview));
                    }
                    Err(err) => {
                        // The chosen path is kept; the preview is display-only.
                        self.preview_error =
                            Some(format!("Error previewing {:?}: {:#}", path, err));
                        self.set_preview(None);
                    }
                }
            }
            Input::Submit => {
                let script = match self.script.clone() {
                    Some(script) => script,
                    None => {
                        log::warn!("Submit requested, but no script is presented.");
                        return;
                    }
                };
                let mut raw_values = Vec::with_capacity(self.fields.len());
                for field in &self.fields {
                    match field {
                        Field::Text { buffer } => raw_values.push(buffer.text().to_string()),
                        Field::Toggle { button } => raw_values
                            .push(if button.is_active() { "true" } else { "false" }.to_owned()),
                        Field::Unsupported => {
                            log::warn!("Submit requested with an unsupported parameter type.");
                            return;
                        }
                    }
                }
                self.hidden = true;
                util::send_output_or_log(
                    Output::Submitted(Submission { script, raw_values }),
                    "parameter submission",
                    &sender,
                );
            }
            Input::Cancel => {
                self.hidden = true;
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let model = Self {
            xdg_dirs: init.xdg_dirs,
            hidden: true,
            script: None,
            fields: Vec::new(),
            browse_buttons: Vec::new(),
            preview_error: None,
            fields_grid: gtk::Grid::new(),
            preview_frame: gtk::Frame::new(Some("Input file preview")),
        };

        let fields_grid = model.fields_grid.clone();
        let preview_frame = model.preview_frame.clone();

        let widgets = view_output!();

        ComponentParts { model, widgets }
    }
}
