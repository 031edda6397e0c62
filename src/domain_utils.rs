use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use url::Url;

/// A host broken into its public-suffix parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostParts {
    pub subdomains: Vec<String>,
    pub domain: String,
    pub suffix: String,
}

impl HostParts {
    /// `domain.suffix`, or just `domain` when no suffix was recognised.
    pub fn registrable_domain(&self) -> String {
        if self.suffix.is_empty() {
            self.domain.clone()
        } else if self.domain.is_empty() {
            self.suffix.clone()
        } else {
            format!("{}.{}", self.domain, self.suffix)
        }
    }
}

/// Minimal domain hierarchy utilities
pub struct DomainUtils;

impl DomainUtils {
    /// Domain part of a sender address: everything after the last `@`.
    /// Without an `@` the whole address is treated as the domain.
    pub fn sender_domain(address: &str) -> String {
        address
            .rsplit('@')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase()
    }

    /// Host segment of a URL. Falls back to a manual parse when the URL
    /// crate rejects the input; never fails, may return an empty string.
    pub fn url_host(url: &str) -> String {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                return host.trim_end_matches('.').to_lowercase();
            }
        }
        Self::manual_host(url)
    }

    fn manual_host(url: &str) -> String {
        let rest = match url.find("://") {
            Some(idx) => &url[idx + 3..],
            None => url,
        };
        let authority = rest
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default();
        let host_port = authority.rsplit('@').next().unwrap_or_default();
        let host = match host_port.rfind(':') {
            Some(idx) if host_port[idx + 1..].chars().all(|c| c.is_ascii_digit()) => {
                &host_port[..idx]
            }
            _ => host_port,
        };
        host.trim_end_matches('.').to_lowercase()
    }

    pub fn is_ipv4(host: &str) -> bool {
        host.parse::<Ipv4Addr>().is_ok()
    }

    /// Split `host` into subdomains, domain and public suffix.
    ///
    /// The suffix is the longest ICANN entry of the Public Suffix List, or the
    /// longest entry of `extra` if that covers more labels. Without a
    /// recognised suffix the last label is the domain and the rest are
    /// subdomains.
    pub fn split_host(host: &str, extra: &BTreeSet<String>) -> HostParts {
        if host.is_empty() || Self::is_ipv4(host) {
            return HostParts {
                subdomains: Vec::new(),
                domain: host.to_string(),
                suffix: String::new(),
            };
        }

        let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();

        let extra_len = (1..=labels.len())
            .rev()
            .find(|&n| extra.contains(&labels[labels.len() - n..].join(".")))
            .unwrap_or(0);
        let suffix_len = Self::icann_suffix_len(&labels).max(extra_len);

        let suffix = labels[labels.len() - suffix_len..].join(".");
        let remaining = &labels[..labels.len() - suffix_len];

        match remaining.split_last() {
            Some((domain, subdomains)) => HostParts {
                subdomains: subdomains.iter().map(|s| s.to_string()).collect(),
                domain: domain.to_string(),
                suffix,
            },
            None => HostParts {
                subdomains: Vec::new(),
                domain: String::new(),
                suffix,
            },
        }
    }

    /// Number of trailing labels forming the ICANN public suffix, 0 when the
    /// TLD is not on the list. Private-section matches (`github.io`) are
    /// skipped in favour of the ICANN suffix beneath them.
    fn icann_suffix_len(labels: &[&str]) -> usize {
        let mut start = 0;
        while start < labels.len() {
            let candidate = labels[start..].join(".");
            let Some(suffix) = psl::suffix(candidate.as_bytes()) else {
                return 0;
            };
            let len = suffix.as_bytes().split(|&b| b == b'.').count();
            match suffix.typ() {
                Some(psl::Type::Private) => start = labels.len() + 1 - len,
                Some(_) => return len,
                None => return 0,
            }
        }
        0
    }
}
