//! Capability setup snippets
//!
//! Before user code runs, the engine executes the setup snippet of every
//! capability whose detector matches the source. Detection is a plain
//! substring heuristic. The built-in registry has:
//!
//! - `basic`: always applied, no-op setup
//! - `matplotlib`: applied when the source mentions `matplotlib` or `plt.`;
//!   clears figures, switches to the Agg backend and replaces `plt.show` with
//!   a printer emitting one `data:image/png;base64,` line per figure

use crate::config::PlottingConfig;

const BASIC_SETUP: &str = "# stdout is captured line by line\n";

const MATPLOTLIB_SETUP: &str = r#"import io
import base64
from matplotlib import pyplot as plt

plt.clf()
plt.close('all')
plt.switch_backend('agg')

def setup_matplotlib_output():
    def custom_show(*args, **kwargs):
        if plt.gcf().get_size_inches().prod() * plt.gcf().dpi ** 2 > __MAX_PIXELS__:
            print("Warning: Plot size too large, reducing quality")
            plt.gcf().set_dpi(__FALLBACK_DPI__)

        png_buf = io.BytesIO()
        plt.savefig(png_buf, format='png')
        png_buf.seek(0)
        png_base64 = base64.b64encode(png_buf.read()).decode('utf-8')
        print(f'data:image/png;base64,{png_base64}')
        png_buf.close()

        plt.clf()
        plt.close('all')

    plt.show = custom_show
"#;

/// When a capability applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detector {
    Always,
    /// Applies when the source contains any of the needles
    AnySubstring(Vec<String>),
}

impl Detector {
    #[must_use]
    pub fn any_of(needles: &[&str]) -> Self {
        Self::AnySubstring(needles.iter().map(|n| (*n).to_string()).collect())
    }

    #[must_use]
    pub fn matches(&self, source: &str) -> bool {
        match self {
            Self::Always => true,
            Self::AnySubstring(needles) => needles.iter().any(|n| source.contains(n.as_str())),
        }
    }
}

/// One named setup program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    name: String,
    setup: String,
    activation: Option<String>,
    detector: Detector,
}

impl Capability {
    #[must_use]
    pub fn new(name: impl Into<String>, setup: impl Into<String>, detector: Detector) -> Self {
        Self {
            name: name.into(),
            setup: setup.into(),
            activation: None,
            detector,
        }
    }

    /// Second statement run right after the setup snippet
    #[must_use]
    pub fn with_activation(mut self, activation: impl Into<String>) -> Self {
        self.activation = Some(activation.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn setup(&self) -> &str {
        &self.setup
    }

    #[inline]
    #[must_use]
    pub fn activation(&self) -> Option<&str> {
        self.activation.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Programs to execute, in order
    pub fn programs(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.setup.as_str()).chain(self.activation.as_deref())
    }
}

/// Ordered capability registry
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    entries: Vec<Capability>,
}

impl CapabilityRegistry {
    /// Registry with no entries
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// `basic` and `matplotlib`
    #[must_use]
    pub fn builtin(plotting: &PlottingConfig) -> Self {
        let matplotlib = MATPLOTLIB_SETUP
            .replace("__MAX_PIXELS__", &plotting.max_pixels.to_string())
            .replace("__FALLBACK_DPI__", &plotting.fallback_dpi.to_string());

        let mut registry = Self::empty();
        registry.register(Capability::new("basic", BASIC_SETUP, Detector::Always));
        registry.register(
            Capability::new("matplotlib", matplotlib, Detector::any_of(&["matplotlib", "plt."]))
                .with_activation("setup_matplotlib_output()"),
        );
        registry
    }

    /// Add or replace an entry by name; new names are appended
    pub fn register(&mut self, capability: Capability) {
        match self.entries.iter_mut().find(|c| c.name == capability.name) {
            Some(existing) => *existing = capability,
            None => self.entries.push(capability),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.entries.iter().find(|c| c.name == name)
    }

    /// Capabilities applying to `source`, in registration order
    #[must_use]
    pub fn detect(&self, source: &str) -> Vec<&Capability> {
        self.entries.iter().filter(|c| c.detector.matches(source)).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Capability::name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(caps: &[&Capability]) -> Vec<String> {
        caps.iter().map(|c| c.name().to_string()).collect()
    }

    #[test]
    fn basic_always_applies() {
        let registry = CapabilityRegistry::builtin(&PlottingConfig::default());
        assert_eq!(names(&registry.detect("print(1)")), vec!["basic"]);
        assert_eq!(names(&registry.detect("")), vec!["basic"]);
    }

    #[test]
    fn plotting_detected_by_substring() {
        let registry = CapabilityRegistry::builtin(&PlottingConfig::default());
        assert_eq!(names(&registry.detect("import matplotlib")), vec!["basic", "matplotlib"]);
        assert_eq!(names(&registry.detect("plt.plot([1, 2])")), vec!["basic", "matplotlib"]);
        assert_eq!(names(&registry.detect("plot = 1")), vec!["basic"]);
    }

    #[test]
    fn plotting_setup_embeds_limits() {
        let plotting = PlottingConfig {
            max_pixels: 1_000,
            fallback_dpi: 50,
        };
        let registry = CapabilityRegistry::builtin(&plotting);
        let setup = registry.get("matplotlib").unwrap();
        assert!(setup.setup().contains("> 1000:"));
        assert!(setup.setup().contains("set_dpi(50)"));
        assert!(setup.setup().contains("plt.switch_backend('agg')"));
        assert!(!setup.setup().contains("__"));
        let programs: Vec<&str> = setup.programs().collect();
        assert_eq!(programs.len(), 2);
        assert_eq!(programs[1], "setup_matplotlib_output()");
    }

    #[test]
    fn register_replaces_by_name() {
        let mut registry = CapabilityRegistry::builtin(&PlottingConfig::default());
        registry.register(Capability::new("basic", "pass", Detector::Always));
        registry.register(Capability::new("pandas", "import pandas", Detector::any_of(&["pd."])));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("basic").unwrap().setup(), "pass");
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["basic", "matplotlib", "pandas"]);
    }
}
