//! End-to-end orchestration over a real knowledge base and the mock generator

use copilot_shared::FinalResult;
use copilotd::gate::ConfidenceGate;
use copilotd::ollama::MockGenerator;
use copilotd::orchestrator::Orchestrator;
use copilotd::rag::RagService;
use copilotd::responders::{ResponderSet, GENERIC_CLARIFICATION, HR_CLARIFICATION};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn write_docs(dir: &TempDir) {
    fs::write(
        dir.path().join("vpn_troubleshooting.txt"),
        "VPN not connecting: restart the client, check MFA, reinstall the VPN profile.",
    )
    .unwrap();
    fs::write(
        dir.path().join("hr_leave_policy.txt"),
        "Annual leave is 25 days per year. Holiday requests go through Workday.",
    )
    .unwrap();
    fs::write(
        dir.path().join("printers.md"),
        "To add a printer install the printer driver from the self-service portal.",
    )
    .unwrap();
}

fn orchestrator(dir: Option<&TempDir>) -> Orchestrator {
    let rag = Arc::new(RagService::new(Arc::new(MockGenerator), 512, 64));
    if let Some(dir) = dir {
        rag.ingest_dir(dir.path()).unwrap();
    }
    Orchestrator::new(ResponderSet::with_service(rag), ConfidenceGate::default())
}

fn ask(orch: &Orchestrator, question: &str) -> FinalResult {
    orch.run(question).unwrap()
}

#[test]
fn test_kb_question_answered_from_matching_document() {
    let dir = TempDir::new().unwrap();
    write_docs(&dir);
    let result = ask(&orchestrator(Some(&dir)), "how do I add a printer");

    assert_eq!(result.responder_name, "kb_answer");
    assert!(result.text.starts_with("Summary: To add a printer"));
    assert_eq!(result.evidence[0].source_id, "printers.md");
    assert!(result.evidence[0].relevance_score.unwrap() >= 0.20);
}

#[test]
fn test_vpn_failure_goes_to_troubleshooting() {
    let dir = TempDir::new().unwrap();
    write_docs(&dir);
    let result = ask(&orchestrator(Some(&dir)), "my vpn keeps failing, it failed again");

    assert_eq!(result.responder_name, "troubleshooting");
    assert_eq!(result.evidence[0].source_id, "vpn_troubleshooting.txt");
    assert!(result.evidence[0].excerpt.contains("restart the client"));
}

#[test]
fn test_hr_question_with_matching_topic_accepted() {
    let dir = TempDir::new().unwrap();
    write_docs(&dir);
    let result = ask(&orchestrator(Some(&dir)), "how many annual leave days do I get");

    assert_eq!(result.responder_name, "kb_answer");
    assert_eq!(result.evidence[0].source_id, "hr_leave_policy.txt");
}

#[test]
fn test_off_topic_hr_document_rejected() {
    let dir = TempDir::new().unwrap();
    write_docs(&dir);
    let result = ask(&orchestrator(Some(&dir)), "how much maternity leave do I get");

    assert_eq!(result.responder_name, "clarifier");
    assert_eq!(result.text, HR_CLARIFICATION);
    assert!(result.evidence.is_empty());
}

#[test]
fn test_empty_knowledge_base_clarifies() {
    let result = ask(&orchestrator(None), "how do I add a printer");

    assert_eq!(result.responder_name, "clarifier");
    assert_eq!(result.text, GENERIC_CLARIFICATION);
}

#[test]
fn test_shared_orchestrator_across_threads() {
    let dir = TempDir::new().unwrap();
    write_docs(&dir);
    let orch = Arc::new(orchestrator(Some(&dir)));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let orch = orch.clone();
            std::thread::spawn(move || orch.run("how do I add a printer").unwrap())
        })
        .collect();

    let expected = orch.run("how do I add a printer").unwrap();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
