//! One subcommand → one orchestrator call → one [`Report`].

use crate::{Command, DemographicArgs};
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;
use ward_runtime::model::{Bill, Demographics, NewVisit, Patient, PatientDraft, Room, Visit};
use ward_runtime::{Orchestrator, WardConfig, WardError};
use ward_types::{ErrorCode, PatientId, VisitId};

/// Rendered result of one command.
pub struct Report {
    pub text: String,
    pub json: Value,
}

impl Report {
    fn new(text: impl Into<String>, value: &impl Serialize) -> Result<Self> {
        Ok(Self {
            text: text.into(),
            json: serde_json::to_value(value)?,
        })
    }
}

impl From<&DemographicArgs> for Demographics {
    fn from(args: &DemographicArgs) -> Self {
        Self {
            age: args.age,
            gender: args.gender.clone(),
            height: args.height,
            weight: args.weight,
        }
    }
}

/// Runs `command` against `orch`.
///
/// # Errors
///
/// Orchestrator failures are returned with their stable error code
/// appended, e.g. `no free room available [WARD_RESOURCE_UNAVAILABLE]`.
pub fn execute(orch: &Orchestrator, command: &Command, config: &WardConfig) -> Result<Report> {
    match command {
        Command::Register {
            name,
            phone,
            demographics,
        } => {
            let draft = PatientDraft::new(name, phone).with_demographics(demographics.into());
            let patient = orch.register_patient(draft).map_err(coded)?;
            Report::new(format!("registered {}", patient_line(&patient)), &patient)
        }

        Command::Find { name, phone } => match orch.find_patient(name, phone).map_err(coded)? {
            Some(patient) => Report::new(patient_line(&patient), &patient),
            None => Report::new("no matching patient", &Value::Null),
        },

        Command::Visit {
            patient,
            symptoms,
            demographics,
        } => {
            let visit = orch
                .create_visit(NewVisit {
                    patient_id: PatientId::new(*patient),
                    demographics: demographics.into(),
                    symptoms: symptoms.clone(),
                })
                .map_err(coded)?;
            Report::new(format!("opened {} for {}", visit.id, visit.patient_id), &visit)
        }

        Command::Diagnose { visit } => {
            let visit = orch.run_diagnosis(VisitId::new(*visit)).map_err(coded)?;
            let text = match &visit.diagnosis {
                Some(d) => format!("{}: {} [{}]", visit.id, d.finding, d.severity),
                None => format!("{}: no diagnosis", visit.id),
            };
            Report::new(text, &visit)
        }

        Command::AssignRoom { visit } => {
            let assignment = orch.assign_room(VisitId::new(*visit)).map_err(coded)?;
            Report::new(
                format!(
                    "{} assigned room {} ({})",
                    assignment.visit.id, assignment.room.number, assignment.room.staff
                ),
                &assignment,
            )
        }

        Command::Complete { visit } => {
            let visit = orch.complete_visit(VisitId::new(*visit)).map_err(coded)?;
            Report::new(format!("{} {}", visit.id, visit.status), &visit)
        }

        Command::Bill { visit, fee } => {
            let fee = fee.unwrap_or(config.billing.consultation_fee);
            let bill = orch.generate_bill(VisitId::new(*visit), fee).map_err(coded)?;
            Report::new(bill_text(&bill), &bill)
        }

        Command::Show { visit } => {
            let details = orch.visit_details(VisitId::new(*visit)).map_err(coded)?;
            let mut text = visit_text(&details.visit);
            let _ = write!(text, "\npatient: {}", patient_line(&details.patient));
            if let Some(bill) = &details.bill {
                let _ = write!(text, "\n{}", bill_text(bill));
            }
            Report::new(text, &details)
        }

        Command::Patients => {
            let patients = orch.list_patients().map_err(coded)?;
            let text = if patients.is_empty() {
                "no patients".to_string()
            } else {
                patients.iter().map(patient_line).collect::<Vec<_>>().join("\n")
            };
            Report::new(text, &patients)
        }

        Command::Rooms => {
            let rooms = orch.list_rooms().map_err(coded)?;
            let text = rooms.iter().map(room_line).collect::<Vec<_>>().join("\n");
            Report::new(text, &rooms)
        }

        Command::ResetRooms => {
            let freed = orch.reset_all_rooms().map_err(coded)?;
            Report::new(
                format!("freed {freed} room(s)"),
                &serde_json::json!({ "freed": freed }),
            )
        }

        Command::Logs { limit } => {
            let limit = limit.unwrap_or(config.audit.default_limit);
            let entries = orch.security_logs(limit).map_err(coded)?;
            let text = entries
                .iter()
                .map(|e| {
                    format!(
                        "#{} {} {:<7} {} {} {}{} {}",
                        e.seq,
                        e.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        e.verdict.to_string(),
                        e.agent,
                        e.action,
                        e.resource_type.as_deref().unwrap_or("-"),
                        e.resource_id.as_deref().map(|id| format!("({id})")).unwrap_or_default(),
                        e.note,
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            Report::new(text, &entries)
        }
    }
}

fn coded(err: WardError) -> anyhow::Error {
    anyhow::anyhow!("{err} [{}]", err.code())
}

fn patient_line(p: &Patient) -> String {
    format!("{} {} ({})", p.id, p.name, p.phone)
}

fn visit_text(v: &Visit) -> String {
    let mut text = format!("{} {} symptoms: {}", v.id, v.status, v.symptoms);
    if let Some(d) = &v.diagnosis {
        let _ = write!(text, "\ndiagnosis: {} [{}]", d.finding, d.severity);
    }
    if let Some(room) = &v.allocated_room {
        let _ = write!(text, "\nroom: {room}");
    }
    text
}

fn bill_text(b: &Bill) -> String {
    let mut text = format!("{} for {} total {:.2}", b.id, b.visit_id, b.total);
    for line in &b.items {
        let _ = write!(text, "\n  {}: {:.2}", line.item, line.amount);
    }
    text
}

fn room_line(r: &Room) -> String {
    let occupant = r.occupant.map(|p| format!("  {p}")).unwrap_or_default();
    format!("{:<6}{:<10}{}{}", r.number, r.status.to_string(), r.staff, occupant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ward_runtime::model::LineItem;

    #[test]
    fn room_line_shows_occupant() {
        let mut room = Room::free("101", "Dr. Mehta");
        assert_eq!(room_line(&room), "101   free      Dr. Mehta");
        room.status = ward_runtime::model::RoomStatus::Occupied;
        room.occupant = Some(PatientId::new(2));
        assert!(room_line(&room).ends_with("Dr. Mehta  patient:2"));
    }

    #[test]
    fn bill_text_lists_items() {
        let bill = Bill {
            id: ward_types::BillId::new(1),
            visit_id: VisitId::new(4),
            items: vec![LineItem::new("Consultation Fee", 500.0)],
            total: 500.0,
            created_at: chrono::Utc::now(),
        };
        let text = bill_text(&bill);
        assert!(text.starts_with("bill:1 for visit:4 total 500.00"));
        assert!(text.contains("Consultation Fee: 500.00"));
    }

    #[test]
    fn errors_carry_code() {
        let err = coded(WardError::ResourceUnavailable { resource: "room" });
        assert_eq!(err.to_string(), "no free room available [WARD_RESOURCE_UNAVAILABLE]");
    }
}
