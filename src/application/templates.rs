use crate::domain::models::{Classification, DayTemplate, SessionTemplate};

fn session(
    title: &str,
    start: &str,
    end: &str,
    description: &str,
    classification: Classification,
) -> SessionTemplate {
    SessionTemplate {
        title: title.to_string(),
        start: start.to_string(),
        end: end.to_string(),
        description: description.to_string(),
        classification,
        location: None,
    }
}

fn bootcamp_session() -> SessionTemplate {
    SessionTemplate {
        title: "Bootcamp Session".to_string(),
        start: "08:00".to_string(),
        end: "13:00".to_string(),
        description: "Organization-wide bootcamp training".to_string(),
        classification: Classification::Learning,
        location: Some("Bootcamp Location".to_string()),
    }
}

/// The built-in Sunday..Thursday week: 75-minute focus sessions with
/// 15-minute gaps, heavier cognitive work in the morning, fixed bootcamp
/// mornings on Tuesday and Thursday. Used whenever a scheduling request
/// carries no custom entries.
pub fn default_week_template() -> Vec<DayTemplate> {
    vec![
        DayTemplate {
            offset_days: 0,
            theme: "Analysis & Planning".to_string(),
            sessions: vec![
                session(
                    "JIRA Analysis - Git Comparison",
                    "09:00",
                    "10:15",
                    "Deep analysis of JIRA tickets and Git commits",
                    Classification::HighCognitive,
                ),
                session(
                    "Test Failure Investigation",
                    "10:30",
                    "11:45",
                    "Investigate and document test failures",
                    Classification::HighCognitive,
                ),
                session(
                    "Use Case Documentation",
                    "14:00",
                    "15:15",
                    "Document use cases and requirements",
                    Classification::MediumCognitive,
                ),
                session(
                    "Implementation Planning",
                    "15:30",
                    "16:45",
                    "Plan implementation approach and timeline",
                    Classification::MediumCognitive,
                ),
            ],
        },
        DayTemplate {
            offset_days: 1,
            theme: "Development Focus".to_string(),
            sessions: vec![
                session(
                    "Core Logic Implementation",
                    "09:00",
                    "10:15",
                    "Implement core business logic",
                    Classification::HighCognitive,
                ),
                session(
                    "Integration Development",
                    "10:30",
                    "11:45",
                    "Develop integration components",
                    Classification::HighCognitive,
                ),
                session(
                    "Test Environment Setup",
                    "14:00",
                    "15:15",
                    "Set up and configure test environments",
                    Classification::MediumCognitive,
                ),
                session(
                    "Integration Test Development",
                    "15:30",
                    "16:45",
                    "Develop integration tests",
                    Classification::MediumCognitive,
                ),
            ],
        },
        DayTemplate {
            offset_days: 2,
            theme: "Bootcamp & Development".to_string(),
            sessions: vec![
                bootcamp_session(),
                session(
                    "Post-Bootcamp Development",
                    "14:00",
                    "15:15",
                    "Apply bootcamp learnings to development",
                    Classification::MediumCognitive,
                ),
                session(
                    "Testing & Debugging",
                    "15:30",
                    "16:45",
                    "Test and debug developed features",
                    Classification::MediumCognitive,
                ),
                session(
                    "Regular JIRA Tasks",
                    "17:00",
                    "18:15",
                    "Work on regular JIRA tickets",
                    Classification::LowCognitive,
                ),
            ],
        },
        DayTemplate {
            offset_days: 3,
            theme: "Testing & Review".to_string(),
            sessions: vec![
                session(
                    "Comprehensive Testing",
                    "09:00",
                    "10:15",
                    "Execute comprehensive test suite",
                    Classification::HighCognitive,
                ),
                session(
                    "Bug Fixing Session",
                    "10:30",
                    "11:45",
                    "Fix identified bugs and issues",
                    Classification::HighCognitive,
                ),
                session(
                    "Final Development Push",
                    "13:00",
                    "14:15",
                    "Complete remaining development tasks",
                    Classification::MediumCognitive,
                ),
                session(
                    "Code Review Preparation",
                    "14:30",
                    "15:45",
                    "Prepare code for review submission",
                    Classification::MediumCognitive,
                ),
            ],
        },
        DayTemplate {
            offset_days: 4,
            theme: "Bootcamp & Finalization".to_string(),
            sessions: vec![
                bootcamp_session(),
                session(
                    "Final Review & Submission",
                    "14:00",
                    "15:15",
                    "Final code review and submission",
                    Classification::MediumCognitive,
                ),
                session(
                    "Documentation Finalization",
                    "15:30",
                    "16:45",
                    "Finalize all documentation",
                    Classification::LowCognitive,
                ),
                session(
                    "Project Wrap-up",
                    "17:00",
                    "18:15",
                    "Project closure and wrap-up activities",
                    Classification::LowCognitive,
                ),
            ],
        },
    ]
}
