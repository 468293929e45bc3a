//! Typed conversion of collected values and script invocation.

use std::{
    fmt::{self, Display},
    io::{self, BufRead, BufReader, Read},
    path::Path,
    process::{Command, ExitStatus, Stdio},
    thread,
};

use anyhow::{Context, Result, anyhow};
use clap::Args;
use thiserror::Error;

use crate::params::{ParamSpec, TypeTag};

/// CLI arguments selecting the script interpreter.
#[derive(Args, Clone, Debug)]
pub struct InterpreterArgs {
    /// Interpreter used to run the scripts.
    #[arg(long, default_value = "python3")]
    interpreter: String,
}

impl InterpreterArgs {
    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }
}

/// Rejection of an invocation before any process is spawned.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum InvokeError {
    #[error("script declares {declared} parameter(s), but {collected} value(s) were collected")]
    CountMismatch { declared: usize, collected: usize },
    #[error("parameter {name:?}: cannot interpret {value:?} as {type_tag}")]
    Coercion {
        name: String,
        type_tag: TypeTag,
        value: String,
    },
    #[error("parameter {name:?} has unsupported type tag {tag:?}")]
    UnsupportedTag { name: String, tag: String },
}

/// A collected value coerced to its declared type.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Display for Value {
    /// Textual form passed to the child process. Booleans render as
    /// `True`/`False`, matching what the scripts' own language prints.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(v) => f.write_str(v),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
        }
    }
}

/// Coerces raw collected values to the declared parameter types.
///
/// The count and order of `raw_values` must exactly match `specs`; any
/// mismatch or unparseable value rejects the whole invocation before a
/// process is spawned.
pub fn coerce_values(specs: &[ParamSpec], raw_values: &[String]) -> Result<Vec<Value>, InvokeError> {
    if specs.len() != raw_values.len() {
        return Err(InvokeError::CountMismatch {
            declared: specs.len(),
            collected: raw_values.len(),
        });
    }

    specs
        .iter()
        .zip(raw_values)
        .map(|(spec, raw)| coerce_value(spec, raw))
        .collect()
}

fn coerce_value(spec: &ParamSpec, raw: &str) -> Result<Value, InvokeError> {
    let coercion_error = || InvokeError::Coercion {
        name: spec.name.clone(),
        type_tag: spec.type_tag.clone(),
        value: raw.to_owned(),
    };

    match &spec.type_tag {
        TypeTag::Int => raw
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| coercion_error()),
        TypeTag::Float => raw
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| coercion_error()),
        TypeTag::Str => Ok(Value::Str(raw.to_owned())),
        TypeTag::Bool => parse_bool(raw).map(Value::Bool).ok_or_else(coercion_error),
        TypeTag::Other(tag) => Err(InvokeError::UnsupportedTag {
            name: spec.name.clone(),
            tag: tag.clone(),
        }),
    }
}

/// Parses an explicit boolean token. Deliberately stricter than "any
/// non-empty string is true": `"False"` must not coerce to true.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// A fully validated request to run one script. Consumed by one call to
/// [invoke]; never reused.
#[derive(Debug)]
pub struct InvokeRequest<'a> {
    pub interpreter: &'a str,
    pub script_path: &'a Path,
    pub values: &'a [Value],
}

/// Builds the argument vector for an [InvokeRequest]: interpreter, script
/// path, then each value in declared order.
pub fn build_argv(request: &InvokeRequest) -> Vec<String> {
    let mut argv = Vec::with_capacity(2 + request.values.len());
    argv.push(request.interpreter.to_owned());
    argv.push(request.script_path.to_string_lossy().into_owned());
    argv.extend(request.values.iter().map(ToString::to_string));
    argv
}

/// Sink for events produced while a child script runs.
pub trait InvokeEvents {
    /// Called once per line of the child's standard output, as produced.
    fn on_line(&mut self, line: &str);
    /// Called after end of the child's standard output with the full
    /// captured standard error, if any was produced.
    fn on_stderr(&mut self, text: &str);
}

/// Spawns the script as a child process and relays its standard output
/// line-by-line to `events` until the child exits.
///
/// This is a single blocking call: it holds the calling thread for the
/// full lifetime of exactly one child process, with no retry and no
/// timeout. Returns the child's own exit status.
pub fn invoke(request: &InvokeRequest, events: &mut dyn InvokeEvents) -> Result<ExitStatus> {
    let argv = build_argv(request);

    let mut child = Command::new(&argv[0])
        .args(&argv[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning {:?}", argv))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("child stdout was not piped"))?;

    // Stderr must be drained concurrently with stdout. A child that fills
    // the stderr pipe's buffer before closing stdout would otherwise block
    // on its write while this thread blocks on read_line, and neither side
    // would ever progress.
    let stderr_reader = child.stderr.take().map(|mut stderr| {
        thread::spawn(move || -> io::Result<String> {
            let mut text = String::new();
            stderr.read_to_string(&mut text)?;
            Ok(text)
        })
    });

    let mut reader = BufReader::new(stdout);
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader
            .read_line(&mut line)
            .with_context(|| "reading child stdout")?;
        if n == 0 {
            break;
        }
        events.on_line(line.trim_end_matches(['\n', '\r']));
    }

    let stderr_text = match stderr_reader {
        Some(handle) => handle
            .join()
            .map_err(|_| anyhow!("stderr reader thread panicked"))?
            .with_context(|| "reading child stderr")?,
        None => String::new(),
    };

    let status = child
        .wait()
        .with_context(|| "waiting for child process to exit")?;

    if !stderr_text.is_empty() {
        events.on_stderr(&stderr_text);
    }

    Ok(status)
}

/// Coerces `raw_values` against `specs` and invokes the script in one
/// step. This is the entry point used by both the CLI and the GUI runner
/// worker.
pub fn invoke_script(
    interpreter: &str,
    script_path: &Path,
    specs: &[ParamSpec],
    raw_values: &[String],
    events: &mut dyn InvokeEvents,
) -> Result<ExitStatus> {
    let values = coerce_values(specs, raw_values)?;
    invoke(
        &InvokeRequest {
            interpreter,
            script_path,
            values: &values,
        },
        events,
    )
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use googletest::{
        assert_that,
        matchers::{elements_are, eq, err, ok},
    };
    use test_casing::test_casing;

    use crate::params::{ParamSpec, TypeTag};

    use super::{InvokeError, InvokeRequest, Value, build_argv, coerce_values};

    fn specs_int_str() -> Vec<ParamSpec> {
        vec![
            ParamSpec::new(TypeTag::Int, "n"),
            ParamSpec::new(TypeTag::Str, "label"),
        ]
    }

    fn raw(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[googletest::test]
    fn coerces_values_to_declared_types() {
        assert_that!(
            coerce_values(&specs_int_str(), &raw(&["42", "abc"])),
            ok(elements_are![
                eq(&Value::Int(42)),
                eq(&Value::Str("abc".to_owned())),
            ]),
        );
    }

    #[googletest::test]
    fn rejects_unparseable_int_naming_the_parameter() {
        assert_that!(
            coerce_values(&specs_int_str(), &raw(&["abc", "ok"])),
            err(eq(&InvokeError::Coercion {
                name: "n".to_owned(),
                type_tag: TypeTag::Int,
                value: "abc".to_owned(),
            })),
        );
    }

    #[googletest::test]
    fn rejects_count_mismatch() {
        assert_that!(
            coerce_values(&specs_int_str(), &raw(&["42"])),
            err(eq(&InvokeError::CountMismatch {
                declared: 2,
                collected: 1,
            })),
        );
    }

    #[googletest::test]
    fn zero_specs_accept_zero_values() {
        assert_that!(coerce_values(&[], &[]), ok(elements_are![]));
    }

    #[googletest::test]
    fn coerces_float() {
        assert_that!(
            coerce_values(&[ParamSpec::new(TypeTag::Float, "x")], &raw(&["2.5"])),
            ok(elements_are![eq(&Value::Float(2.5))]),
        );
    }

    const TRUE_TOKENS: [&str; 5] = ["true", "True", "TRUE", "1", "yes"];

    #[test_casing(5, TRUE_TOKENS)]
    fn bool_true_tokens(token: &str) {
        assert_that!(
            coerce_values(&[ParamSpec::new(TypeTag::Bool, "flag")], &raw(&[token])),
            ok(elements_are![eq(&Value::Bool(true))]),
        );
    }

    const FALSE_TOKENS: [&str; 5] = ["false", "False", "FALSE", "0", "no"];

    #[test_casing(5, FALSE_TOKENS)]
    fn bool_false_tokens(token: &str) {
        assert_that!(
            coerce_values(&[ParamSpec::new(TypeTag::Bool, "flag")], &raw(&[token])),
            ok(elements_are![eq(&Value::Bool(false))]),
        );
    }

    const BAD_BOOL_TOKENS: [&str; 3] = ["", "on", "Falsey"];

    #[test_casing(3, BAD_BOOL_TOKENS)]
    fn bool_rejects_other_tokens(token: &str) {
        assert_that!(
            coerce_values(&[ParamSpec::new(TypeTag::Bool, "flag")], &raw(&[token])),
            err(eq(&InvokeError::Coercion {
                name: "flag".to_owned(),
                type_tag: TypeTag::Bool,
                value: token.to_owned(),
            })),
        );
    }

    #[googletest::test]
    fn rejects_unsupported_tag() {
        assert_that!(
            coerce_values(
                &[ParamSpec::new(TypeTag::Other("list".to_owned()), "values")],
                &raw(&["anything"]),
            ),
            err(eq(&InvokeError::UnsupportedTag {
                name: "values".to_owned(),
                tag: "list".to_owned(),
            })),
        );
    }

    #[googletest::test]
    fn builds_argv_in_declared_order() {
        let values = vec![Value::Int(7)];
        let request = InvokeRequest {
            interpreter: "python3",
            script_path: Path::new("/tmp/job.py"),
            values: &values,
        };
        assert_that!(
            build_argv(&request),
            elements_are![eq("python3"), eq("/tmp/job.py"), eq("7")],
        );
    }

    #[googletest::test]
    fn renders_bool_values_like_python() {
        assert_that!(Value::Bool(true).to_string(), eq("True"));
        assert_that!(Value::Bool(false).to_string(), eq("False"));
    }

    #[cfg(unix)]
    mod child_process {
        use std::{fs, process::ExitStatus};

        use googletest::{
            assert_that,
            matchers::{elements_are, eq},
        };
        use tempfile::tempdir;

        use super::super::{InvokeEvents, InvokeRequest, invoke};

        #[derive(Default)]
        struct CapturedEvents {
            lines: Vec<String>,
            stderr: Vec<String>,
        }

        impl InvokeEvents for CapturedEvents {
            fn on_line(&mut self, line: &str) {
                self.lines.push(line.to_owned());
            }

            fn on_stderr(&mut self, text: &str) {
                self.stderr.push(text.to_owned());
            }
        }

        fn run_shell_script(body: &str) -> (ExitStatus, CapturedEvents) {
            let dir = tempdir().expect("should create temp dir");
            let script_path = dir.path().join("script.sh");
            fs::write(&script_path, body).expect("should write script");

            let mut events = CapturedEvents::default();
            let status = invoke(
                &InvokeRequest {
                    interpreter: "sh",
                    script_path: &script_path,
                    values: &[],
                },
                &mut events,
            )
            .expect("should invoke");
            (status, events)
        }

        #[googletest::test]
        fn relays_stdout_lines_and_exit_status() {
            let (status, events) = run_shell_script("echo one\necho two\nexit 3\n");

            assert_that!(events.lines, elements_are![eq("one"), eq("two")]);
            assert_that!(events.stderr.len(), eq(0));
            assert_that!(status.code(), eq(Some(3)));
        }

        #[googletest::test]
        fn captures_stderr_separately() {
            let (status, events) = run_shell_script("echo out\necho oops >&2\n");

            assert_that!(events.lines, elements_are![eq("out")]);
            assert_that!(events.stderr, elements_are![eq("oops\n")]);
            assert_that!(status.success(), eq(true));
        }

        #[googletest::test]
        fn drains_stderr_larger_than_pipe_buffer_before_stdout_closes() {
            // Each stderr line is 65 bytes; 4096 of them comfortably exceed
            // the OS pipe buffer, so the child would wedge on its stderr
            // write if the parent only read stderr after stdout ended.
            let body = concat!(
                "i=0\n",
                "while [ $i -lt 4096 ]; do\n",
                "  echo \"................................................................\" >&2\n",
                "  i=$((i+1))\n",
                "done\n",
                "echo done\n",
            );
            let (status, events) = run_shell_script(body);

            assert_that!(events.lines, elements_are![eq("done")]);
            assert_that!(events.stderr.len(), eq(1));
            assert_that!(events.stderr[0].len(), eq(4096 * 65));
            assert_that!(status.success(), eq(true));
        }

        #[googletest::test]
        fn zero_param_script_gets_no_arguments() {
            let (status, events) = run_shell_script("echo \"argc=$#\"\n");

            assert_that!(events.lines, elements_are![eq("argc=0")]);
            assert_that!(status.success(), eq(true));
        }
    }
}
