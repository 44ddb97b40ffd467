/// Styling stack the generated component should target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framework {
    #[default]
    HtmlCss,
    HtmlTailwind,
    HtmlBootstrap,
    HtmlCssJs,
    HtmlTailwindBootstrap,
}

impl Framework {
    /// Identifier embedded in the generation instruction
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::HtmlCss => "html-css",
            Framework::HtmlTailwind => "html-tailwind",
            Framework::HtmlBootstrap => "html-bootstrap",
            Framework::HtmlCssJs => "html-css-js",
            Framework::HtmlTailwindBootstrap => "html-tailwind-bootstrap",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|f| f.as_str() == s.trim().to_lowercase())
    }

    pub fn all() -> Vec<Framework> {
        vec![
            Framework::HtmlCss,
            Framework::HtmlTailwind,
            Framework::HtmlBootstrap,
            Framework::HtmlCssJs,
            Framework::HtmlTailwindBootstrap,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Framework::HtmlCss => "HTML + CSS",
            Framework::HtmlTailwind => "HTML + Tailwind CSS",
            Framework::HtmlBootstrap => "HTML + Bootstrap",
            Framework::HtmlCssJs => "HTML + CSS + JS",
            Framework::HtmlTailwindBootstrap => "HTML + Tailwind + Bootstrap",
        }
    }

    /// Position in [`Framework::all`], used by list widgets
    pub fn index(&self) -> usize {
        Self::all().iter().position(|f| f == self).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_first_option() {
        assert_eq!(Framework::default(), Framework::all()[0]);
        assert_eq!(Framework::default().as_str(), "html-css");
    }

    #[test]
    fn test_from_str_round_trips_every_option() {
        for framework in Framework::all() {
            assert_eq!(Framework::from_str(framework.as_str()), Some(framework));
        }
        assert_eq!(Framework::from_str(" HTML-Tailwind "), Some(Framework::HtmlTailwind));
        assert_eq!(Framework::from_str("react"), None);
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, framework) in Framework::all().into_iter().enumerate() {
            assert_eq!(framework.index(), i);
        }
    }
}
