//! Mapping of free-text channel labels to canonical fluorophore names.

use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Known fluorophores, in match priority order.
pub const KNOWN_FLUOROPHORES: [&str; 6] = ["GFP", "Citrine", "RFP", "CFP", "Venus", "Cherry"];

/// Result of resolving a channel label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedChannel {
    /// Label contained a known fluorophore name
    Known(&'static str),
    /// Label matched nothing; carried through unchanged
    Unknown(String),
}

impl ResolvedChannel {
    /// Name to use for calibration lookup
    pub fn name(&self) -> &str {
        match self {
            ResolvedChannel::Known(name) => name,
            ResolvedChannel::Unknown(label) => label,
        }
    }
}

/// Resolves channel labels such as `"sfGFP 485/528"` to `"GFP"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelNameResolver;

impl ChannelNameResolver {
    /// Case-insensitive substring match against [`KNOWN_FLUOROPHORES`].
    pub fn resolve(&self, label: &str) -> ResolvedChannel {
        let upper = label.to_uppercase();
        KNOWN_FLUOROPHORES
            .iter()
            .find(|name| upper.contains(&name.to_uppercase()))
            .map(|name| ResolvedChannel::Known(*name))
            .unwrap_or_else(|| ResolvedChannel::Unknown(label.to_string()))
    }

    /// Resolve a label, recording a warning when it matches nothing.
    pub fn resolve_or_warn(&self, label: &str, diagnostics: &mut Diagnostics) -> String {
        match self.resolve(label) {
            ResolvedChannel::Known(name) => name.to_string(),
            ResolvedChannel::Unknown(label) => {
                diagnostics.push(
                    DiagnosticKind::UnknownChannelName,
                    format!(
                        "Unable to convert channel '{}' into a standard channel name; no molar conversion for it",
                        label
                    ),
                    label.clone(),
                );
                label
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        let resolver = ChannelNameResolver;
        assert_eq!(resolver.resolve("GFP"), ResolvedChannel::Known("GFP"));
        assert_eq!(resolver.resolve("sfgfp_485"), ResolvedChannel::Known("GFP"));
        assert_eq!(resolver.resolve("mCherry"), ResolvedChannel::Known("Cherry"));
        assert_eq!(resolver.resolve("CITRINE"), ResolvedChannel::Known("Citrine"));
        assert_eq!(resolver.resolve("venus-yfp"), ResolvedChannel::Known("Venus"));
    }

    #[test]
    fn test_priority_order() {
        // GFP is checked before CFP
        assert_eq!(ChannelNameResolver.resolve("CFP/GFP FRET"), ResolvedChannel::Known("GFP"));
    }

    #[test]
    fn test_unknown_warns_and_passes_through() {
        let mut diags = Diagnostics::new();
        let name = ChannelNameResolver.resolve_or_warn("mScarlet", &mut diags);
        assert_eq!(name, "mScarlet");
        assert_eq!(diags.count(DiagnosticKind::UnknownChannelName), 1);

        let name = ChannelNameResolver.resolve_or_warn("RFP", &mut diags);
        assert_eq!(name, "RFP");
        assert_eq!(diags.len(), 1);
    }
}
