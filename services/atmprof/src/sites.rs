//! Built-in observatory registry.
//!
//! Resolves a handful of well-known air-shower observatory names to
//! coordinates so the common sites do not need explicit `--coordinates`.

/// A named observation site.
#[derive(Debug, Clone, Copy)]
pub struct Site {
    pub name: &'static str,
    /// Geodetic latitude [deg], north positive.
    pub latitude: f64,
    /// Longitude [deg], east positive.
    pub longitude: f64,
}

/// Known observatories.
pub const SITES: &[Site] = &[
    Site {
        name: "auger",
        latitude: -35.28,
        longitude: -69.32,
    },
    Site {
        name: "lofar",
        latitude: 52.91,
        longitude: 6.87,
    },
    Site {
        name: "kascade",
        latitude: 49.10,
        longitude: 8.44,
    },
    Site {
        name: "magic",
        latitude: 28.76,
        longitude: -17.89,
    },
];

/// Case-insensitive lookup by name.
pub fn lookup(name: &str) -> Option<&'static Site> {
    SITES.iter().find(|site| site.name.eq_ignore_ascii_case(name))
}

/// All registered names, for error messages.
pub fn known_names() -> Vec<&'static str> {
    SITES.iter().map(|site| site.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let site = lookup("Auger").unwrap();
        assert_eq!(site.name, "auger");
        assert!(site.latitude < 0.0);
        assert!(lookup("LOFAR").is_some());
    }

    #[test]
    fn unknown_site_is_none() {
        assert!(lookup("atlantis").is_none());
        assert_eq!(known_names().len(), SITES.len());
    }
}
