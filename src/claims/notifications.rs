use super::models::{ClaimChange, ClaimRecord, PreviousClaim, service_label, status_label};
use crate::directory::Role;
use crate::notify::PushNotificationPayload;

/// A notification derived from a claim change and the roles it goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimNotification {
    pub payload: PushNotificationPayload,
    pub roles: Vec<Role>,
}

fn claim_url(claim: &ClaimRecord) -> String {
    format!("/reclamos/{}", claim.id)
}

/// New claims go to everyone.
pub fn notification_for_insert(claim: &ClaimRecord) -> ClaimNotification {
    let body = format!(
        "#{} - {}\n📍 {}",
        claim.short_id(),
        service_label(&claim.tipo_servicio),
        claim.direccion.as_deref().unwrap_or_default()
    );
    ClaimNotification {
        payload: PushNotificationPayload::new("📋 Nuevo Reclamo", &body, Some(&claim_url(claim))),
        roles: vec![Role::Admin, Role::Technician],
    }
}

/// Updates only notify when the status or the assigned technician
/// changed. A column missing from `old` counts as changed. Admins
/// always hear about it; technicians only when the claim has someone
/// assigned.
pub fn notification_for_update(old: &PreviousClaim, new: &ClaimRecord) -> Option<ClaimNotification> {
    let status_changed = old.status_differs(&new.estado);
    let technician_changed = old.assigned_technician() != new.assigned_technician();
    if !status_changed && !technician_changed {
        return None;
    }

    let mut title = "🔄 Reclamo Actualizado";
    let mut body = format!(
        "#{} - {}",
        new.short_id(),
        service_label(&new.tipo_servicio)
    );

    if status_changed {
        body.push_str(&format!("\n📊 Estado: {}", status_label(&new.estado)));
    }

    if new.assigned_technician().is_some() && technician_changed {
        title = "🎯 Reclamo Asignado";
        body.push_str("\n👨‍🔧 Se ha asignado un técnico");
    }

    let mut roles = vec![Role::Admin];
    if new.assigned_technician().is_some() {
        roles.push(Role::Technician);
    }

    Some(ClaimNotification {
        payload: PushNotificationPayload::new(title, &body, Some(&claim_url(new))),
        roles,
    })
}

/// Derive the notification for any claim change. Deletes are silent.
pub fn notification_for_change(change: &ClaimChange) -> Option<ClaimNotification> {
    match change {
        ClaimChange::Insert { new } => Some(notification_for_insert(new)),
        ClaimChange::Update { old, new } => notification_for_update(old, new),
        ClaimChange::Delete { .. } => None,
    }
}
