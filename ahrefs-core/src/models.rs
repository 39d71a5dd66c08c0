//! Site Explorer response models
//!
//! Every model is declared with [`record!`](crate::record), so it
//! deserializes from the API payload and renders in any output format.
//! Fields the API may leave out are optional and are dropped from JSON
//! output when absent.

use crate::record;

record! {
    /// Response of `/site-explorer/domain-rating`
    pub struct DomainRatingResponse {
        pub domain_rating: DomainRating,
    }
}

record! {
    /// Domain rating of a target
    pub struct DomainRating {
        /// Domain rating on a 0-100 scale
        pub domain_rating: f64,
    }
}

record! {
    /// Response of `/site-explorer/backlinks-stats`
    pub struct BacklinksStatsResponse {
        pub metrics: BacklinksMetrics,
    }
}

record! {
    /// Backlink totals for a target
    pub struct BacklinksMetrics {
        /// Live backlinks
        pub live: i64,
        /// Referring domains
        pub refdomains: Option<i64>,
        pub dofollow: Option<i64>,
        /// Links from governmental domains
        pub governmental: Option<i64>,
        /// Links from educational domains
        pub educational: Option<i64>,
    }
}

record! {
    /// Response of `/site-explorer/backlinks`
    pub struct BacklinksResponse {
        pub backlinks: Vec<Backlink>,
    }
}

record! {
    /// A single backlink
    pub struct Backlink {
        /// Linking page
        pub url_from: String,
        /// Linked page on the target
        pub url_to: String,
        /// Domain rating of the linking domain
        pub domain_rating: Option<f64>,
        pub ahrefs_rank: Option<i64>,
        pub anchor: Option<String>,
        /// HTTP status of the linking page
        pub http_code: Option<i64>,
        pub first_seen: Option<String>,
        pub last_visited: Option<String>,
        /// Link kind, e.g. `dofollow`
        pub link_type: Option<String>,
        pub url_rating: Option<f64>,
        /// Estimated organic traffic of the linking page
        pub traffic: Option<i64>,
    }
}

record! {
    /// Response of `/site-explorer/refdomains`
    pub struct RefDomainsResponse {
        pub refdomains: Vec<RefDomain>,
    }
}

record! {
    /// A referring domain
    pub struct RefDomain {
        pub domain: String,
        pub domain_rating: Option<f64>,
        pub url_rating: Option<f64>,
        pub ahrefs_rank: Option<i64>,
        /// Backlinks from this domain to the target
        pub backlinks: Option<i64>,
        pub dofollow: Option<i64>,
        /// Target pages linked from this domain
        pub linked_pages: Option<i64>,
        pub first_seen: Option<String>,
        pub last_visited: Option<String>,
    }
}

record! {
    /// Response of `/site-explorer/anchors`
    pub struct AnchorsResponse {
        pub anchors: Vec<Anchor>,
    }
}

record! {
    /// Anchor text usage
    pub struct Anchor {
        pub anchor: String,
        pub backlinks: Option<i64>,
        pub refdomains: Option<i64>,
        pub first_seen: Option<String>,
        pub last_visited: Option<String>,
    }
}

record! {
    /// Response of `/site-explorer/organic-keywords`
    pub struct OrganicKeywordsResponse {
        pub keywords: Vec<OrganicKeyword>,
    }
}

record! {
    /// A keyword the target ranks for
    pub struct OrganicKeyword {
        pub keyword: String,
        /// Ranking position
        pub position: Option<i64>,
        /// Monthly search volume
        #[wire = "volume"]
        pub search_volume: Option<i64>,
        pub traffic: Option<i64>,
        /// Keyword difficulty
        #[wire = "kd"]
        pub keyword_difficulty: Option<f64>,
        /// Ranking URL
        pub url: Option<String>,
        pub country: Option<String>,
    }
}

record! {
    /// Response of `/site-explorer/top-pages`
    pub struct TopPagesResponse {
        pub pages: Vec<TopPage>,
    }
}

record! {
    /// A top page by organic traffic
    pub struct TopPage {
        pub url: String,
        pub traffic: Option<i64>,
        /// Estimated value of the traffic
        pub traffic_value: Option<f64>,
        pub keywords: Option<i64>,
        pub top_keyword: Option<String>,
        pub position: Option<i64>,
        pub volume: Option<i64>,
        pub url_rating: Option<f64>,
    }
}

record! {
    /// Response of `/site-explorer/broken-backlinks`
    pub struct BrokenBacklinksResponse {
        pub backlinks: Vec<BrokenBacklink>,
    }
}

record! {
    /// A backlink pointing at a broken page
    pub struct BrokenBacklink {
        pub url_from: String,
        pub url_to: String,
        pub domain_rating: Option<f64>,
        /// HTTP status returned by the linked page
        pub http_code: Option<i64>,
        pub anchor: Option<String>,
        pub first_seen: Option<String>,
        pub last_visited: Option<String>,
    }
}

record! {
    /// Response of `/site-explorer/linked-domains`
    pub struct LinkedDomainsResponse {
        pub linked_domains: Vec<LinkedDomain>,
    }
}

record! {
    /// A domain the target links to
    pub struct LinkedDomain {
        pub domain: String,
        pub domain_rating: Option<f64>,
        pub linked_pages: Option<i64>,
        pub backlinks: Option<i64>,
        pub first_seen: Option<String>,
    }
}

record! {
    /// Response of `/site-explorer/metrics`
    pub struct MetricsResponse {
        pub metrics: SiteMetrics,
    }
}

record! {
    /// Organic and paid search metrics
    pub struct SiteMetrics {
        pub org_keywords: Option<i64>,
        /// Keywords ranking in the top 3
        pub org_keywords_2: Option<i64>,
        pub org_traffic: Option<i64>,
        pub org_cost: Option<f64>,
        pub paid_keywords: Option<i64>,
        pub paid_traffic: Option<i64>,
        pub paid_cost: Option<f64>,
        pub featured_snippets: Option<i64>,
    }
}

record! {
    /// Response of `/site-explorer/metrics-history`
    pub struct MetricsHistoryResponse {
        pub metrics: Vec<MetricsHistoryEntry>,
    }
}

record! {
    /// Metrics snapshot for a single date
    pub struct MetricsHistoryEntry {
        pub date: String,
        pub org_keywords: Option<i64>,
        pub org_traffic: Option<i64>,
        pub org_cost: Option<f64>,
        pub paid_keywords: Option<i64>,
        pub paid_traffic: Option<i64>,
        pub domain_rating: Option<f64>,
    }
}

record! {
    /// Response of `/site-explorer/pages-by-traffic`
    pub struct PagesByTrafficResponse {
        pub pages: Vec<PageByTraffic>,
    }
}

record! {
    pub struct PageByTraffic {
        pub url: String,
        pub traffic: Option<i64>,
        pub traffic_value: Option<f64>,
        pub keywords: Option<i64>,
        pub url_rating: Option<f64>,
    }
}

record! {
    /// Response of `/site-explorer/best-by-links`
    pub struct BestByLinksResponse {
        pub pages: Vec<PageByLinks>,
    }
}

record! {
    pub struct PageByLinks {
        pub url: String,
        pub backlinks: Option<i64>,
        pub refdomains: Option<i64>,
        pub url_rating: Option<f64>,
        pub traffic: Option<i64>,
        pub first_seen: Option<String>,
    }
}
