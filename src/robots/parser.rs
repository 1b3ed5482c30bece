//! Robots.txt rule set
//!
//! Allow/Disallow matching is delegated to the robotstxt crate. The crate
//! does not expose `Crawl-delay`, so groups are scanned here for it.

use robotstxt::DefaultMatcher;

/// Exclusion rules for one origin
///
/// An empty body means the site places no restrictions.
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    content: String,
}

/// One `User-agent` group and the crawl delay it declares
#[derive(Debug)]
struct AgentGroup {
    agents: Vec<String>,
    crawl_delay: Option<f64>,
}

impl ParsedRobots {
    /// Wraps a robots.txt body
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Rules that admit every URL
    ///
    /// Used when the site has no robots.txt, when it cannot be loaded, and
    /// when robots handling is disabled.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Rules that reject every URL, used when robots.txt access is refused
    pub fn disallow_all() -> Self {
        Self::from_content("User-agent: *\nDisallow: /")
    }

    /// Returns true when no rule can ever reject a URL
    pub fn allows_everything(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Checks whether `url` may be fetched by the crawler named `product_token`
    ///
    /// `url` may be absolute; only its path and query take part in matching.
    pub fn is_allowed(&self, url: &str, product_token: &str) -> bool {
        if self.allows_everything() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, product_token, url)
    }

    /// `Crawl-delay` in seconds for `product_token`
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, product_token: &str) -> Option<f64> {
        let token = product_token.to_ascii_lowercase();
        let groups = self.groups();

        let specific = groups
            .iter()
            .filter(|g| g.agents.iter().any(|a| a != "*" && token.contains(a.as_str())))
            .find_map(|g| g.crawl_delay);

        specific.or_else(|| {
            groups
                .iter()
                .filter(|g| g.agents.iter().any(|a| a == "*"))
                .find_map(|g| g.crawl_delay)
        })
    }

    fn groups(&self) -> Vec<AgentGroup> {
        let mut groups: Vec<AgentGroup> = Vec::new();
        let mut in_agent_lines = false;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "user-agent" => {
                    // Consecutive User-agent lines share one group
                    if !in_agent_lines || groups.is_empty() {
                        groups.push(AgentGroup {
                            agents: Vec::new(),
                            crawl_delay: None,
                        });
                    }
                    if let Some(group) = groups.last_mut() {
                        group.agents.push(value.to_ascii_lowercase());
                    }
                    in_agent_lines = true;
                }
                "crawl-delay" => {
                    in_agent_lines = false;
                    if let (Some(group), Ok(delay)) = (groups.last_mut(), value.parse::<f64>()) {
                        group.crawl_delay.get_or_insert(delay);
                    }
                }
                _ => in_agent_lines = false,
            }
        }

        groups
    }
}
