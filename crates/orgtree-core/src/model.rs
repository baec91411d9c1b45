//! Core data structures for the organizational graph

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content-derived identifier of a node. Equal paths give equal identifiers,
/// across processes and across snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier(pub Uuid);

impl Identifier {
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for Identifier {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Identifier)
    }
}

/// Identifier of a snapshot, derived from its (source path, filter) key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub Uuid);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

/// Sequence number of a node inside its snapshot, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct NodeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Unit,
    Position,
}

/// Functional class of a unit, as declared by the `unidad_clase` column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitClass {
    Substantive,
    Support,
    Control,
    Other(String),
}

impl UnitClass {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Sustantiva" => UnitClass::Substantive,
            "Apoyo" => UnitClass::Support,
            "Control" => UnitClass::Control,
            other => UnitClass::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            UnitClass::Substantive => "Sustantiva",
            UnitClass::Support => "Apoyo",
            UnitClass::Control => "Control",
            UnitClass::Other(raw) => raw,
        }
    }
}

/// Legal nature of the administration a row belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdministrationType {
    CentralAdministration,
    InterstateCompany,
    StateOwnedCompany,
    InterstateEntity,
    BinationalEntity,
    NonStatePublicEntity,
    TrustFund,
    StateSocialSecurityProvider,
    DecentralizedAgency,
    DeconcentratedAgency,
    OfficialBankingSystem,
    Corporation,
    SingleMemberCorporation,
    MajorityStateOwnedCorporation,
    StateOwnedEnterprise,
    Other(String),
}

impl AdministrationType {
    const KNOWN: [(&'static str, AdministrationType); 15] = [
        ("Administración Central", AdministrationType::CentralAdministration),
        ("Empresa Interestadual", AdministrationType::InterstateCompany),
        ("Empresa del estado", AdministrationType::StateOwnedCompany),
        ("Ente Interestadual", AdministrationType::InterstateEntity),
        ("Ente binacional", AdministrationType::BinationalEntity),
        ("Ente público no estatal", AdministrationType::NonStatePublicEntity),
        ("Fondo Fiduciario", AdministrationType::TrustFund),
        ("Obra Social Estatal", AdministrationType::StateSocialSecurityProvider),
        ("Organismo Descentralizado", AdministrationType::DecentralizedAgency),
        ("Organismo Desconcentrado", AdministrationType::DeconcentratedAgency),
        ("Sistema bancario oficial", AdministrationType::OfficialBankingSystem),
        ("Sociedad Anónima", AdministrationType::Corporation),
        ("Sociedad Anónima Unipersonal", AdministrationType::SingleMemberCorporation),
        (
            "Sociedad Anónima con participación estatal mayoritaria",
            AdministrationType::MajorityStateOwnedCorporation,
        ),
        ("Sociedad del Estado", AdministrationType::StateOwnedEnterprise),
    ];

    pub fn parse(raw: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|(label, _)| *label == raw)
            .map(|(_, kind)| kind.clone())
            .unwrap_or_else(|| AdministrationType::Other(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        if let AdministrationType::Other(raw) = self {
            return raw;
        }
        Self::KNOWN
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(label, _)| *label)
            .unwrap_or_default()
    }
}

/// An organizational unit (ministry, secretariat, directorate...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: NodeId,
    pub name: String,
    pub identifier: Identifier,
    pub snapshot_id: SnapshotId,
    pub short_name: String,
    pub administration_type: AdministrationType,
    pub unit_class: UnitClass,
    /// Hierarchical rank label, e.g. "Ministerio" or "Dirección Nacional - General".
    pub range: String,
}

/// A staffed post inside a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: NodeId,
    pub name: String,
    pub identifier: Identifier,
    pub snapshot_id: SnapshotId,
    pub position_name: String,
    /// Raw ordinal text; kept verbatim because it feeds the identifier.
    pub position_order: String,
    pub incumbent_first_name: String,
    pub incumbent_last_name: String,
    /// Parent unit name as declared by the row.
    pub reports_to: String,
    /// The owning unit.
    pub unit: Identifier,
}

impl Position {
    /// Display label: `"{position} ({order}): {last}, {first}"`, the incumbent
    /// part omitted when the post is vacant.
    pub fn display_name(position_name: &str, order: &str, last: &str, first: &str) -> String {
        if last.is_empty() {
            format!("{position_name} ({order})")
        } else {
            format!("{position_name} ({order}): {last}, {first}")
        }
    }
}

/// A node of the hierarchy: either a unit or a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Unit(Unit),
    Position(Position),
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Unit(unit) => unit.id,
            Node::Position(position) => position.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Unit(unit) => &unit.name,
            Node::Position(position) => &position.name,
        }
    }

    pub fn identifier(&self) -> Identifier {
        match self {
            Node::Unit(unit) => unit.identifier,
            Node::Position(position) => position.identifier,
        }
    }

    pub fn snapshot_id(&self) -> SnapshotId {
        match self {
            Node::Unit(unit) => unit.snapshot_id,
            Node::Position(position) => position.snapshot_id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Unit(_) => NodeKind::Unit,
            Node::Position(_) => NodeKind::Position,
        }
    }

    pub fn as_unit(&self) -> Option<&Unit> {
        match self {
            Node::Unit(unit) => Some(unit),
            Node::Position(_) => None,
        }
    }

    pub fn as_position(&self) -> Option<&Position> {
        match self {
            Node::Position(position) => Some(position),
            Node::Unit(_) => None,
        }
    }
}

/// "source is the immediate parent of target".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: Identifier,
    pub target: Identifier,
    pub snapshot_id: SnapshotId,
}

/// A URL cited by a unit's competencies/norms text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentReference {
    pub unit: Identifier,
    pub url: String,
}
