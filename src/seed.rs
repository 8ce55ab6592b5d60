use crate::model::{Assignee, Priority, Status, Task, TaskId};

/// Default tasks used when the slot is empty or cannot be parsed.
pub fn seed_tasks() -> Vec<Task> {
    vec![
        seed(
            1,
            "Design homepage mockups",
            "Wireframes and high fidelity mockups for the Acme Corp landing page",
            "Sarah Johnson",
            Priority::High,
            "2024-01-20",
            Status::InProgress,
        ),
        seed(
            2,
            "Client onboarding call",
            "Kickoff call with TechStart to walk through the project plan",
            "Mike Chen",
            Priority::Medium,
            "2024-01-18",
            Status::Done,
        ),
        seed(
            3,
            "Prepare Q1 invoices",
            "Generate and send invoices for all active retainers",
            "Emily Davis",
            Priority::High,
            "2024-01-25",
            Status::Todo,
        ),
        seed(
            4,
            "Update brand guidelines",
            "Fold the new color palette and typography into the brand book",
            "Sarah Johnson",
            Priority::Low,
            "",
            Status::Todo,
        ),
        seed(
            5,
            "API integration review",
            "Review the payment gateway integration before launch",
            "Alex Rivera",
            Priority::Medium,
            "2024-01-25",
            Status::Todo,
        ),
    ]
}

fn seed(
    id: TaskId,
    title: &str,
    description: &str,
    assignee: &str,
    priority: Priority,
    due_date: &str,
    status: Status,
) -> Task {
    Task {
        id,
        title: title.to_string(),
        description: description.to_string(),
        assignee: Assignee::from_name(assignee),
        priority,
        due_date: due_date.to_string(),
        status,
    }
}
