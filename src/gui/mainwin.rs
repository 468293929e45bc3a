use std::{path::PathBuf, sync::Arc};

use gtk::prelude::{
    BoxExt, ButtonExt, GtkWindowExt, OrientableExt, TextBufferExt, TextViewExt, WidgetExt,
};
use relm4::{
    gtk, Component, ComponentController, ComponentParts, ComponentSender, Controller, RelmApp,
    RelmWidgetExt, SimpleComponent, WorkerController,
};

use crate::{
    gui::{
        components::errordialog,
        paramsform, scriptlist,
        workers::runner,
    },
    scripts::ScriptEntry,
};

/// Input messages for [MainWindow].
#[derive(Debug)]
enum Input {
    Refresh,
    RunSelected,
    // Internal:
    Selected(Option<ScriptEntry>),
    ListError(String),
    Submitted(paramsform::Submission),
    RunnerOutput(runner::Output),
}

/// Initialisation parameters for [MainWindow].
pub struct Init {
    pub xdg_dirs: Arc<xdg::BaseDirectories>,
    pub scripts_dir: PathBuf,
    pub interpreter: String,
}

/// Relm4 window component that acts as the main window for the GUI
/// interface to Scriptdash.
struct MainWindow {
    script_list: Controller<scriptlist::ScriptList>,
    params_form: Controller<paramsform::ParamsForm>,
    runner: WorkerController<runner::RunnerWorker>,
    error_dialog: Controller<errordialog::ErrorDialog>,

    selected: Option<ScriptEntry>,
    running: bool,
    output_buffer: gtk::TextBuffer,
}

impl MainWindow {
    fn append_output_line(&self, line: &str) {
        let mut end = self.output_buffer.end_iter();
        self.output_buffer.insert(&mut end, line);
        self.output_buffer.insert(&mut end, "\n");
    }

    fn start_run(&mut self, script: ScriptEntry, raw_values: Vec<String>) {
        self.running = true;
        self.runner.emit(runner::Input::Start(runner::Request {
            script,
            raw_values,
        }));
    }
}

#[relm4::component]
impl SimpleComponent for MainWindow {
    type Init = Init;

    type Input = Input;
    type Output = ();

    view! {
        gtk::Window {
            set_title: Some("Script Dashboard"),
            set_default_width: 800,
            set_default_height: 600,

            gtk::Box {
                set_orientation: gtk::Orientation::Vertical,
                set_spacing: 5,
                set_margin_all: 5,

                model.script_list.widget(),

                gtk::Box {
                    set_orientation: gtk::Orientation::Horizontal,
                    set_spacing: 5,

                    gtk::Button::with_label("Refresh") {
                        connect_clicked[sender] => move |_| {
                            sender.input(Input::Refresh);
                        },
                    },
                    gtk::Button::with_label("Run Script") {
                        #[watch]
                        set_sensitive: model.selected.is_some() && !model.running,
                        connect_clicked[sender] => move |_| {
                            sender.input(Input::RunSelected);
                        },
                    },
                },

                gtk::Frame::new(Some("Output")) {
                    set_vexpand: true,

                    gtk::ScrolledWindow {
                        gtk::TextView {
                            set_editable: false,
                            set_monospace: true,
                            set_buffer: Some(&model.output_buffer),
                            add_css_class: "output-log",
                        },
                    },
                },
            }
        }
    }

    fn update(&mut self, message: Self::Input, _sender: ComponentSender<Self>) {
        match message {
            Input::Refresh => {
                self.script_list.emit(scriptlist::Input::Reload);
            }
            Input::Selected(entry) => {
                self.selected = entry;
            }
            Input::ListError(message) => {
                self.error_dialog.emit(errordialog::Input::Show(
                    errordialog::Notice {
                        summary: "Failed to list scripts".to_owned(),
                        detail: message,
                    },
                ));
            }
            Input::RunSelected => {
                if self.running {
                    log::warn!("Run requested while a script is already running.");
                    return;
                }
                let script = match self.selected.clone() {
                    Some(script) => script,
                    None => {
                        log::warn!("Run requested without a selected script.");
                        return;
                    }
                };
                if script.params.is_empty() {
                    self.start_run(script, Vec::new());
                } else {
                    self.params_form.emit(paramsform::Input::Present(script));
                }
            }
            Input::Submitted(submission) => {
                self.start_run(submission.script, submission.raw_values);
            }
            Input::RunnerOutput(output) => match output {
                runner::Output::Started { script_name } => {
                    self.output_buffer.set_text("");
                    self.append_output_line(&format!("Running {}...", script_name));
                }
                runner::Output::Line(line) => {
                    self.append_output_line(&line);
                }
                runner::Output::Stderr(text) => {
                    self.append_output_line(&format!("Errors from script:\n{}", text));
                }
                runner::Output::Exited {
                    script_name,
                    code,
                    success,
                } => {
                    self.running = false;
                    match (success, code) {
                        (true, _) => {
                            self.append_output_line(&format!("{} completed.", script_name));
                        }
                        (false, Some(code)) => {
                            self.append_output_line(&format!(
                                "{} exited with status {}.",
                                script_name, code
                            ));
                        }
                        (false, None) => {
                            self.append_output_line(&format!(
                                "{} was terminated by a signal.",
                                script_name
                            ));
                        }
                    }
                }
                runner::Output::Failed(message) => {
                    self.running = false;
                    self.error_dialog.emit(errordialog::Input::Show(
                        errordialog::Notice {
                            summary: "Script run failed".to_owned(),
                            detail: message,
                        },
                    ));
                }
            },
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let model = Self {
            script_list: scriptlist::ScriptList::builder()
                .launch(scriptlist::Init {
                    scripts_dir: init.scripts_dir,
                })
                .forward(sender.input_sender(), |msg| match msg {
                    scriptlist::Output::Selected(entry) => Input::Selected(entry),
                    scriptlist::Output::Error(message) => Input::ListError(message),
                }),
            params_form: paramsform::ParamsForm::builder()
                .launch(paramsform::Init {
                    xdg_dirs: init.xdg_dirs,
                })
                .forward(sender.input_sender(), |msg| match msg {
                    paramsform::Output::Submitted(submission) => Input::Submitted(submission),
                }),
            runner: runner::RunnerWorker::builder()
                .detach_worker(runner::Init {
                    interpreter: init.interpreter,
                })
                .forward(sender.input_sender(), Input::RunnerOutput),
            error_dialog: errordialog::ErrorDialog::builder().launch(()).detach(),

            selected: None,
            running: false,
            output_buffer: gtk::TextBuffer::new(None),
        };

        let widgets = view_output!();

        ComponentParts { model, widgets }
    }
}

/// Runs in the GUI thread for the lifetime of the GUI itself.
pub fn run_gui(init: Init, gtk_args: Vec<String>) {
    let app = RelmApp::new("scriptdash.gui").with_args(gtk_args);
    super::install_stylesheet();
    app.run::<MainWindow>(init);
}
