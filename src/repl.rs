//! Read-Eval-Print Loop
//!
//! [`Interpreter`] is the statement pipeline (parse, permission gate,
//! execute) with no terminal I/O, so tests drive it directly. [`run`]
//! wraps it in the interactive loop: one statement is fully executed
//! (including any fallback branch) before the next line is accepted, and
//! every error is reported and the loop continues. Only `exit`, `quit`,
//! end-of-input, or an interrupt end the process.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::error::Result;
use crate::executor::{Executor, Outcome};
use crate::output::render_table;
use crate::session::Session;
use crate::statement;
use crate::store::RecordStore;

const HELP: &str = "\
Commands:
  SELECT * FROM <table> [WHERE <field> = '<value>']
  INSERT INTO <table> VALUES (<field>=<value>, ...)
  UPDATE <table> SET <field>=<value>[, ...] WHERE <field>='<value>'
  DELETE FROM <table> WHERE <field>='<value>'
  put-item <table> {\"field\": value, ...}
  get-item <table> {\"key\": value}
  update-item <table> {\"key\": value, \"field\": value, ...}
  delete-item <table> {\"key\": value}
  scan <table>
  list-tables
  help | exit | quit";

/// The statement pipeline behind the prompt
pub struct Interpreter {
    session: Session,
    executor: Executor,
}

impl Interpreter {
    #[must_use]
    pub fn new(session: Session, store: Arc<dyn RecordStore>) -> Self {
        Self { session, executor: Executor::new(store) }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Parse, permission-check, and execute one line
    ///
    /// A line that fails to parse or is denied never reaches the store.
    pub async fn interpret(&self, line: &str) -> Result<Outcome> {
        let statement = statement::parse(line)?;
        self.session.authorize(&statement)?;
        self.executor.execute(statement).await
    }
}

/// Run the interactive prompt until exit/quit or end of input
pub async fn run(interpreter: &Interpreter) -> anyhow::Result<()> {
    let mut stdout = io::stdout();
    let stdin = io::stdin();
    println!("Type 'help' for the command list.");

    loop {
        write!(stdout, "\ndynql:{}> ", interpreter.session().role())?;
        stdout.flush()?;

        let mut buffer = String::new();
        if stdin.lock().read_line(&mut buffer)? == 0 {
            break; // end of input
        }
        let line = buffer.trim();
        if line.is_empty() {
            continue;
        }
        match line.to_ascii_lowercase().as_str() {
            "exit" | "quit" => break,
            "help" => {
                println!("{HELP}");
                continue;
            }
            _ => {}
        }

        match interpreter.interpret(line).await {
            Ok(outcome) => print!("{}", render_outcome(&outcome)),
            Err(err) => eprintln!("{err} [{}]", err.error_code()),
        }
    }
    Ok(())
}

/// Render an outcome for the terminal
fn render_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Rows { records, via_scan_fallback } => {
            let mut out = String::new();
            if *via_scan_fallback {
                out.push_str("note: not a key lookup; fell back to a filtered scan\n");
            }
            out.push_str(&render_table(records));
            out
        }
        Outcome::Stored => "item stored\n".to_string(),
        Outcome::Updated => "item updated\n".to_string(),
        Outcome::Deleted => "item deleted\n".to_string(),
        Outcome::NoOp { reason } => format!("warning: {reason}\n"),
        Outcome::Tables(names) => {
            if names.is_empty() {
                "(no tables)\n".to_string()
            } else {
                let mut out = names.join("\n");
                out.push('\n');
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Capability;
    use crate::store::memory::MemoryStore;
    use crate::value::Value;

    fn interpreter_with(capabilities: &[Capability]) -> (Interpreter, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.create_table("inventory", &["sku"]);
        let session = Session::new("op", "tester", capabilities.iter().copied().collect());
        (Interpreter::new(session, store.clone()), store)
    }

    #[tokio::test]
    async fn test_syntax_error_reaches_no_store() {
        let (interpreter, store) = interpreter_with(&[Capability::Read]);
        let err = interpreter.interpret("SELECT broken").await.unwrap_err();
        assert_eq!(err.error_code(), "SYNTAX_ERROR");
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_denied_statement_reaches_no_store() {
        let (interpreter, store) = interpreter_with(&[Capability::Read]);
        let err = interpreter
            .interpret("INSERT INTO inventory VALUES (sku='A-1')")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_interpret_executes_permitted_statement() {
        let (interpreter, store) = interpreter_with(&[Capability::Read, Capability::Insert]);
        interpreter
            .interpret("INSERT INTO inventory VALUES (sku='A-1', qty=3)")
            .await
            .unwrap();
        let rows = store.scan("inventory", None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["qty"], Value::Int(3));
    }

    #[test]
    fn test_render_outcome_surfaces_fallback() {
        let rendered = render_outcome(&Outcome::Rows {
            records: vec![],
            via_scan_fallback: true,
        });
        assert!(rendered.contains("filtered scan"));
        assert!(rendered.contains("(no rows)"));
    }

    #[test]
    fn test_render_outcome_noop_warning() {
        let rendered = render_outcome(&Outcome::NoOp { reason: "nothing to update".to_string() });
        assert!(rendered.starts_with("warning:"));
    }
}
