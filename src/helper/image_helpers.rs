use futures_util::future::join_all;
use reqwest::Client;
use std::collections::{BTreeSet, HashMap};

/// Turns the image references stored on posts into URLs a browser can load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResolver {
    bucket_name: String,
    bucket_url: Option<String>,
    default_image: String,
}

impl ImageResolver {
    pub fn new(bucket_name: &str, bucket_url: Option<&str>, default_image: &str) -> Self {
        ImageResolver {
            bucket_name: bucket_name.to_string(),
            bucket_url: bucket_url
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            default_image: default_image.to_string(),
        }
    }

    pub fn default_image(&self) -> &str {
        &self.default_image
    }

    /// Resolution rules:
    /// * empty, or anything that is not `https://`, `s3://` or site-relative: the default image
    /// * `s3://<configured bucket>/<key>` with a public bucket URL: `<bucket url>/<key>`
    /// * `s3://<bucket>/<key>` otherwise: `https://<bucket>.s3.amazonaws.com/<key>`
    /// * `https://...` and `/...`: unchanged
    pub fn resolve(&self, path: &str) -> String {
        let path = path.trim();
        if path.is_empty() {
            return self.default_image.clone();
        }

        if let Some(rest) = path.strip_prefix("s3://") {
            let (bucket, key) = match rest.split_once('/') {
                Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => (bucket, key),
                _ => return self.default_image.clone(),
            };
            return match &self.bucket_url {
                Some(base) if bucket == self.bucket_name => format!("{}/{}", base, key),
                _ => format!("https://{}.s3.amazonaws.com/{}", bucket, key),
            };
        }

        if path.starts_with("https://") || (path.starts_with('/') && !path.starts_with("//")) {
            return path.to_string();
        }

        self.default_image.clone()
    }

    pub fn resolve_opt(&self, path: Option<&str>) -> String {
        self.resolve(path.unwrap_or_default())
    }
}

/// Resolves every path and probes the remote ones with concurrent HEAD
/// requests. Returns `original path -> usable URL`; a probe that fails or
/// answers non-2xx maps to the default image. Site-relative paths are not
/// probed.
pub async fn validate_images(http: &Client, resolver: &ImageResolver, paths: &[String]) -> HashMap<String, String> {
    let unique: BTreeSet<&String> = paths.iter().collect();
    let probes = unique.into_iter().map(|original| async move {
        let resolved = resolver.resolve(original);
        let usable = probe(http, resolved, resolver.default_image()).await;
        (original.clone(), usable)
    });
    join_all(probes).await.into_iter().collect()
}

async fn probe(http: &Client, url: String, default_image: &str) -> String {
    if url == default_image || url.starts_with('/') {
        return url;
    }
    match http.head(&url).send().await {
        Ok(response) if response.status().is_success() => url,
        Ok(response) => {
            log::debug!("Image {} answered {}, using default", url, response.status());
            default_image.to_string()
        }
        Err(e) => {
            log::debug!("Image {} unreachable ({}), using default", url, e);
            default_image.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ImageResolver {
        ImageResolver::new("wcrt-content-images", Some("https://cdn.example.org/"), "/static/article.jpg")
    }

    #[test]
    fn empty_and_unknown_schemes_fall_back() {
        let r = resolver();
        assert_eq!(r.resolve(""), "/static/article.jpg");
        assert_eq!(r.resolve("   "), "/static/article.jpg");
        assert_eq!(r.resolve("ftp://x/y.png"), "/static/article.jpg");
        assert_eq!(r.resolve("http://insecure.example.org/a.png"), "/static/article.jpg");
        assert_eq!(r.resolve("//protocol-relative.example.org/a.png"), "/static/article.jpg");
        assert_eq!(r.resolve_opt(None), "/static/article.jpg");
    }

    #[test]
    fn s3_paths_are_rewritten() {
        let r = resolver();
        assert_eq!(r.resolve("s3://wcrt-content-images/posts/a.png"), "https://cdn.example.org/posts/a.png");
        assert_eq!(r.resolve("s3://other-bucket/a.png"), "https://other-bucket.s3.amazonaws.com/a.png");
        assert_eq!(r.resolve("s3://wcrt-content-images"), "/static/article.jpg");
        assert_eq!(r.resolve("s3:///key.png"), "/static/article.jpg");

        let no_public_url = ImageResolver::new("wcrt-content-images", None, "/static/article.jpg");
        assert_eq!(
            no_public_url.resolve("s3://wcrt-content-images/a.png"),
            "https://wcrt-content-images.s3.amazonaws.com/a.png"
        );
    }

    #[test]
    fn https_and_site_paths_pass_through() {
        let r = resolver();
        assert_eq!(r.resolve("https://img.example.org/a.jpg"), "https://img.example.org/a.jpg");
        assert_eq!(r.resolve("/article.jpg"), "/article.jpg");
    }
}
