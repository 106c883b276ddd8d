//! Built-in CIS v8.1 self-assessment content.

use assess_core::model::{
    AnswerOption, MaturityScore, OptionId, Question, QuestionDraft, QuestionId,
};
use async_trait::async_trait;

use crate::repository::{QuestionRepository, StorageError};

/// Stepper titles, one per CIS control plus two governance questions.
pub const CIS_STEP_TITLES: [&str; 20] = [
    "Inventory and Control of Enterprise Assets",
    "Inventory and Control of Software Assets",
    "Data Protection",
    "Secure Configuration of Enterprise Assets and Software",
    "Account Management",
    "Access Control Management",
    "Continuous Vulnerability Management",
    "Audit Log Management",
    "Email and Web Browser Protections",
    "Malware Defenses",
    "Data Recovery",
    "Network Infrastructure Management",
    "Network Monitoring and Defense",
    "Security Awareness and Skills Training",
    "Service Provider Management",
    "Application Software Security",
    "Incident Response Management",
    "Penetration Testing",
    "AQ 1. IT Governance",
    "AQ 2. Data Governance",
];

const CATEGORY: &str = "CIS v8.1";

struct SeedQuestion {
    id: &'static str,
    topic: &'static str,
    prompt: &'static str,
    help_text: &'static str,
    options: [&'static str; 4],
}

const SEED: [SeedQuestion; 3] = [
    SeedQuestion {
        id: "q1",
        topic: "1. Inventory and Control of Enterprise Assets",
        prompt: "How are known/unknown assets that connect to the organization's infrastructure documented, and how are unauthorized assets handled?",
        help_text: "This involves authorized and non-authorized devices that connect to the network. For example, printers, IoT devices, Wi-Fi sharing devices, and personal devices, etc. CIS: 1.1 / 1.2 / 1.3 / 1.4 / 1.5",
        options: [
            "No inventory of known assets. No action is taken on unauthorized assets.",
            "Organization owned assets are registered and maintained in a Central Configuration Management Database (CMDB) bi-annually, or more frequently. No action is taken on unauthorized assets.",
            "All organization-owned asset information collection/update is automated and stored in the Central Configuration Management Database (CMDB) for all available sources (for example, mobile device manager and DHCP). Every week the process to check and either remove, deny or quarantine unauthorized assets is carried out.",
            "All organization-owned asset information collection/update is automated and stored in the Central Configuration Management Database (CMDB) from all available sources (for example, mobile device manager and DHCP). Unauthorized assets are detected and registered in the CMDB automatically and classified as untrusted until asset is classified differently through the asset registration process. A passive discovery tool is used to identify assets connected to the organization's network. The information from the passive scans is used to update the CMDB at least weekly, or more frequently.",
        ],
    },
    SeedQuestion {
        id: "q2",
        topic: "2. Inventory and Control of Software Assets",
        prompt: "How are (software) applications identified and registered in your organization?",
        help_text: "How does your organization identify and keep track of the various software applications that are used within its operations. This includes both internally developed applications as well as third-party applications that are utilized by the organization. CIS 2.1 / 2.4",
        options: [
            "Applications are not being registered or managed.",
            "A manual inventory process is in place to register applications. The software inventory is reviewed and updated bi-annually, or more frequently.",
            "Application inventory is manual. All applications are registered manually in the CMDB, for each application the following information is documented: Title, publisher, initial install/use date, and business purpose. Where appropriate, include the URL, app store(s), version(s), deployment mechanism, and decommission date. The software inventory is reviewed and updated bi-annually, or more frequently.",
            "Application inventory is automated. All applications are registered in the CMDB, for each application the following information is documented: Title, publisher, initial install/use date, and business purpose. Where appropriate, include the URL, app store(s), version(s), deployment mechanism, and decommission date. Application usage is monitored for both registered and unregistered (shadow-IT) software. Monthly reports on shadow-IT are provided to risk manager and/or security manager for further assessment.",
        ],
    },
    SeedQuestion {
        id: "q3",
        topic: "3. Data Protection",
        prompt: "How is data management organized in your organization?",
        help_text: "A data management policy covers various processes related to how data is stored, handled, and moved, as well as issues like data ownership, sensitivity, retention, and disposal requirements. CIS 3.1 / 3.2 / 3.8",
        options: [
            "Our organization does not have a data management policy. It is unclear where sensitive data resides or how data is protected.",
            "A data management policy is available. Data management processes are implemented.",
            "A data management policy is available. Data management processes are implemented. Tooling is used to automatically inventory data. Compliance is reported to stakeholders manually. Data flows are not documented.",
            "A data management policy is available, and data management processes are implemented. Data flows are documented based upon the data management process. Data compliance is monitored and automatically reported to stakeholders at least each quarter or the organization has established attack resilient data management.",
        ],
    },
];

/// The three seeded questions, bound to steps 1..=3.
///
/// Option ids follow `<question>-opt<n>` and option `n` scores `n`.
///
/// # Errors
///
/// Returns `assess_core::Error` if the embedded content fails validation.
pub fn cis_questions() -> Result<Vec<Question>, assess_core::Error> {
    SEED.iter()
        .enumerate()
        .map(|(step_index, seed)| build(step_index, seed))
        .collect()
}

fn build(step_index: usize, seed: &SeedQuestion) -> Result<Question, assess_core::Error> {
    let mut options = Vec::with_capacity(seed.options.len());
    for (n, text) in (1_u8..).zip(seed.options) {
        options.push(AnswerOption::new(
            OptionId::new(format!("{}-opt{n}", seed.id))?,
            text,
            MaturityScore::new(n)?,
        ));
    }
    let question = Question::new(
        QuestionId::new(seed.id)?,
        QuestionDraft {
            category: CATEGORY.to_owned(),
            topic: seed.topic.to_owned(),
            prompt: seed.prompt.to_owned(),
            help_text: seed.help_text.to_owned(),
            options,
            step_index,
        },
    )?;
    Ok(question)
}

/// Serves the built-in questions through the repository contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

#[async_trait]
impl QuestionRepository for BuiltinCatalog {
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        cis_questions().map_err(|e| StorageError::Serialization(e.to_string()))
    }
}
