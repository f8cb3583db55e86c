/**
 * URL Construction and Reversal
 *
 * The serialized record representation carries a set of related-resource
 * URLs. They are built here, next to the router that serves them, and each
 * identity-bearing URL has a matching parser so a URL can be resolved back
 * to the record/page it refers to.
 */

/// `GET /api/feedback`
pub fn feedback_list_url() -> String {
    "/api/feedback".to_string()
}

/// `GET /api/pages/{page_id}/feedback`
pub fn page_feedback_list_url(page_id: i64) -> String {
    format!("/api/pages/{page_id}/feedback")
}

/// `GET /api/pages/{page_id}/feedback/{id}` - page-scoped detail
pub fn feedback_view_url(page_id: i64, id: i64) -> String {
    format!("/api/pages/{page_id}/feedback/{id}")
}

/// `GET /api/feedback/{id}`
pub fn feedback_detail_url(id: i64) -> String {
    format!("/api/feedback/{id}")
}

/// `DELETE /api/feedback/{id}` - same path as the detail, different method
pub fn feedback_delete_url(id: i64) -> String {
    feedback_detail_url(id)
}

/// Reverse a detail (or delete) URL back to its record ID
pub fn parse_feedback_detail_url(url: &str) -> Option<i64> {
    let rest = url.strip_prefix("/api/feedback/")?;
    rest.parse().ok()
}

/// Reverse a page-list URL back to its page ID
pub fn parse_page_feedback_list_url(url: &str) -> Option<i64> {
    let rest = url.strip_prefix("/api/pages/")?;
    let page = rest.strip_suffix("/feedback")?;
    page.parse().ok()
}

/// Reverse a page-scoped view URL back to its (page, record) pair
pub fn parse_feedback_view_url(url: &str) -> Option<(i64, i64)> {
    let rest = url.strip_prefix("/api/pages/")?;
    let (page, rest) = rest.split_once("/feedback/")?;
    Some((page.parse().ok()?, rest.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_url_set_round_trips_to_the_same_identities() {
        let (page_id, id) = (7, 42);

        assert_eq!(
            parse_feedback_detail_url(&feedback_detail_url(id)),
            Some(id)
        );
        assert_eq!(
            parse_feedback_detail_url(&feedback_delete_url(id)),
            Some(id)
        );
        assert_eq!(
            parse_page_feedback_list_url(&page_feedback_list_url(page_id)),
            Some(page_id)
        );
        assert_eq!(
            parse_feedback_view_url(&feedback_view_url(page_id, id)),
            Some((page_id, id))
        );
    }

    #[test]
    fn test_foreign_urls_do_not_reverse() {
        assert_eq!(parse_feedback_detail_url("/api/feedback/aggregate"), None);
        assert_eq!(parse_page_feedback_list_url("/api/pages/7/summary"), None);
        assert_eq!(parse_feedback_view_url("/api/pages/x/feedback/1"), None);
    }
}
