use std::path::Path;

/// Scanner properties in first-appearance order.
///
/// Inserting an existing key replaces its value in place, so the last
/// definition in a file wins without moving the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SonarProperties {
    entries: Vec<(String, String)>,
}

impl SonarProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render each property as a `-Dkey=value` scanner argument.
    pub fn to_args(&self) -> Vec<String> {
        self.iter().map(|(k, v)| format!("-D{k}={v}")).collect()
    }
}

impl IntoIterator for SonarProperties {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SonarProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = SonarProperties::new();
        for (k, v) in iter {
            props.insert(k.into(), v.into());
        }
        props
    }
}

/// Parse `key=value` lines. Blank lines and `#` comments are skipped, lines
/// without `=` are ignored, and only the first `=` separates key from value.
pub fn parse_properties(contents: &str) -> SonarProperties {
    let mut props = SonarProperties::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => props.insert(key.trim().to_string(), value.trim().to_string()),
            None => tracing::debug!(line = %line, "Ignoring properties line without '='"),
        }
    }

    props
}

/// Read scanner properties from disk.
///
/// Never fails: a missing or unreadable file yields an empty set and a log line.
pub async fn get_sonar_properties(path: &Path) -> SonarProperties {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => parse_properties(&contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Properties file not found");
            SonarProperties::new()
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to read properties file");
            SonarProperties::new()
        }
    }
}
