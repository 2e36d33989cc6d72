//! Team card lookup. Cards are matched by their `data-member` attribute;
//! markup without the attribute falls back to the exact (trimmed) name text.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardEntry {
    pub member: Option<String>,
    pub name: Option<String>,
}

impl CardEntry {
    pub fn new(member: Option<&str>, name: Option<&str>) -> Self {
        Self {
            member: member.map(str::to_owned),
            name: name.map(|n| n.trim().to_owned()),
        }
    }
}

/// Index of the card for `wanted`, attribute matches taking priority.
pub fn resolve(cards: &[CardEntry], wanted: &str) -> Option<usize> {
    cards
        .iter()
        .position(|c| c.member.as_deref() == Some(wanted))
        .or_else(|| cards.iter().position(|c| c.name.as_deref() == Some(wanted)))
}
