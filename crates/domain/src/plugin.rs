use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub enum PluginCategory {
    AudioFilter,
    VideoFilter,
}

/// Static registration data for one filter.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub shortname: &'static str,
    pub description: &'static str,
    pub category: PluginCategory,
    /// Capability name the host matches filters against.
    pub capability: &'static str,
    pub shortcuts: &'static [&'static str],
}

impl PluginDescriptor {
    pub fn answers_to(&self, name: &str) -> bool {
        self.shortcuts.iter().any(|shortcut| *shortcut == name)
    }
}
