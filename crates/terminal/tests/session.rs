//! A terminal session saved to disk and picked up again.

use greenstone_config::TerminalConfig;
use greenstone_scripting::Value;
use greenstone_storage::StateStore;
use greenstone_terminal::{JobOutcome, Terminal};

#[test]
fn test_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = TerminalConfig {
        state_file: dir.path().join("state.json"),
        ..TerminalConfig::default()
    };
    let store = StateStore::new(&config.state_file);

    let mut term = Terminal::new(config.clone()).unwrap();
    term.run("\"count\" \"<n 1 add >n\" fwriteall 0 >n");
    term.run("\"count\" run \"count\" run <n print");
    store.save(&term.save_data()).unwrap();

    let data = store.load().unwrap().expect("state should have been saved");
    let mut term = Terminal::from_save_data(config, data).unwrap();
    assert!(term.logs().ends_with("<n print\n2\n"));

    let outcome = term.run("\"count\" run <n");
    assert!(outcome.is_completed());
    assert_eq!(term.context().stack().values(), &[Value::Int(3)]);
}

#[test]
fn test_failed_job_message_lands_in_saved_logs() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));

    let mut term = Terminal::new(TerminalConfig::default()).unwrap();
    let outcome = term.run("newlist 1 2 tolist 5 listget");
    assert!(matches!(outcome, JobOutcome::ExecFailed(_)));
    store.save(&term.save_data()).unwrap();

    let logs = store.load().unwrap().unwrap().logs;
    assert_eq!(
        logs,
        ">newlist 1 2 tolist 5 listget\n\
         Execution error: Index 5 is out of range 0..2.\n\
         newlist 1 2 tolist 5 listget\n                     ^^^^^^^\n"
    );
}
