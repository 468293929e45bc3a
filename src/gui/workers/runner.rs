use relm4::Worker;

use crate::{
    gui::util,
    invoke::{self, InvokeEvents},
    scripts::ScriptEntry,
};

/// Initialisation data for [RunnerWorker].
pub struct Init {
    pub interpreter: String,
}

/// Specifies a script run for [RunnerWorker] to perform.
#[derive(Debug)]
pub struct Request {
    pub script: ScriptEntry,
    pub raw_values: Vec<String>,
}

/// Input messages for [RunnerWorker].
#[derive(Debug)]
pub enum Input {
    Start(Request),
}

/// Output messages for [RunnerWorker].
#[derive(Debug)]
pub enum Output {
    /// The child process has been spawned.
    Started { script_name: String },
    /// Relays one line of the child process's standard output.
    Line(String),
    /// Relays the child process's captured standard error.
    Stderr(String),
    /// The child process has terminated. `code` is `None` if it was killed
    /// by a signal.
    Exited {
        script_name: String,
        code: Option<i32>,
        success: bool,
    },
    /// The run could not be started or completed. This is terminal for the
    /// run, like [Output::Exited].
    Failed(String),
}

/// Worker component running one script invocation at a time.
///
/// Runs block the worker's thread, so requests queue behind the current run
/// rather than overlapping it.
pub struct RunnerWorker {
    interpreter: String,
}

impl Worker for RunnerWorker {
    type Init = Init;
    type Input = Input;
    type Output = Output;

    fn init(init: Self::Init, _sender: relm4::ComponentSender<Self>) -> Self {
        Self {
            interpreter: init.interpreter,
        }
    }

    fn update(&mut self, message: Self::Input, sender: relm4::ComponentSender<Self>) {
        match message {
            Input::Start(request) => {
                let script_name = request.script.name.clone();
                util::send_output_or_log(
                    Output::Started {
                        script_name: script_name.clone(),
                    },
                    "run started message",
                    &sender,
                );

                let mut events = EventRelay { sender: &sender };
                let result = invoke::invoke_script(
                    &self.interpreter,
                    &request.script.path,
                    &request.script.params,
                    &request.raw_values,
                    &mut events,
                );

                let output = match result {
                    Ok(status) => Output::Exited {
                        script_name,
                        code: status.code(),
                        success: status.success(),
                    },
                    Err(err) => Output::Failed(format!("Running {}: {:#}", script_name, err)),
                };
                util::send_output_or_log(output, "run ended message", &sender);
            }
        }
    }
}

struct EventRelay<'a> {
    sender: &'a relm4::ComponentSender<RunnerWorker>,
}

impl InvokeEvents for EventRelay<'_> {
    fn on_line(&mut self, line: &str) {
        util::send_output_or_log(Output::Line(line.to_owned()), "output line", self.sender);
    }

    fn on_stderr(&mut self, text: &str) {
        util::send_output_or_log(Output::Stderr(text.to_owned()), "stderr text", self.sender);
    }
}
