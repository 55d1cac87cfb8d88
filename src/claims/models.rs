use serde::{Deserialize, Serialize};

/// A claim row as the backend serializes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaimRecord {
    pub id: String,
    #[serde(default)]
    pub creado_por: Option<String>,
    #[serde(default)]
    pub tecnico_asignado: Option<String>,
    pub tipo_servicio: String,
    #[serde(default)]
    pub cliente_nombre: Option<String>,
    #[serde(default)]
    pub cliente_telefono: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub latitud: Option<f64>,
    #[serde(default)]
    pub longitud: Option<f64>,
    #[serde(default)]
    pub descripcion: Option<String>,
    pub estado: String,
    #[serde(default)]
    pub fecha_creacion: Option<String>,
    #[serde(default)]
    pub fecha_actualizacion: Option<String>,
    #[serde(default)]
    pub foto_cierre: Option<String>,
}

impl ClaimRecord {
    /// The assigned technician, treating an empty string as unassigned.
    pub fn assigned_technician(&self) -> Option<&str> {
        self.tecnico_asignado.as_deref().filter(|t| !t.is_empty())
    }

    /// Short reference shown to users: the first 8 characters of the id.
    pub fn short_id(&self) -> String {
        self.id.chars().take(8).collect()
    }
}

/// The `old` side of a change. With the table's default replica
/// identity only the primary key is sent, so every column is optional
/// and a missing one never compares equal to the new value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PreviousClaim {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub tecnico_asignado: Option<String>,
}

impl PreviousClaim {
    pub fn assigned_technician(&self) -> Option<&str> {
        self.tecnico_asignado.as_deref().filter(|t| !t.is_empty())
    }

    pub fn status_differs(&self, estado: &str) -> bool {
        self.estado.as_deref() != Some(estado)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Insert,
    Update,
    Delete,
}

impl ChangeType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "INSERT" => Some(ChangeType::Insert),
            "UPDATE" => Some(ChangeType::Update),
            "DELETE" => Some(ChangeType::Delete),
            _ => None,
        }
    }
}

/// A row change on a claim, already checked for the records each
/// change type needs.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimChange {
    Insert { new: ClaimRecord },
    Update { old: PreviousClaim, new: ClaimRecord },
    Delete { old: Option<PreviousClaim> },
}

impl ClaimChange {
    pub fn record_id(&self) -> Option<&str> {
        match self {
            ClaimChange::Insert { new } | ClaimChange::Update { new, .. } => Some(&new.id),
            ClaimChange::Delete { old } => old.as_ref().and_then(|r| r.id.as_deref()),
        }
    }
}

pub fn service_label(tipo_servicio: &str) -> &str {
    match tipo_servicio {
        "fibra_optica" => "Fibra Óptica",
        "adsl" => "ADSL",
        "tv" => "Televisión",
        "telefono" => "Teléfono",
        other => other,
    }
}

pub fn status_label(estado: &str) -> &str {
    match estado {
        "pendiente" => "Pendiente",
        "en_proceso" => "En Proceso",
        "completado" => "Completado",
        other => other,
    }
}
