// crates/dataprep-services/src/social.rs
// ============================================================================
// Module: Social Fixtures
// Description: Tags, comments, and likes on repository nodes.
// Purpose: Add, list, and remove social metadata through the public REST API.
// Dependencies: dataprep-core, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`SocialService`] manages the `tags`, `comments`, and `ratings`
//! sub-collections of a node. Removal looks the item up by its text first, so
//! adding and then removing the same tag or comment leaves the node as it was.
//! Tags match case-insensitively with the same folding the name resolver
//! uses; comments match exactly. Listings are paged until the server reports
//! no more items.

// ============================================================================
// SECTION: Imports
// ============================================================================

use dataprep_core::Credentials;
use dataprep_core::DataPrepError;
use dataprep_core::HttpClient;
use dataprep_core::NodeRef;
use dataprep_core::RestRequest;
use dataprep_core::fold_name;
use dataprep_core::http::PUBLIC_API_PATH;
use dataprep_core::require_value;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::warn;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of list entries requested per page.
pub const LIST_PAGE_SIZE: usize = 100;

/// Rating scheme used for likes.
const LIKES_SCHEME: &str = "likes";

// ============================================================================
// SECTION: Types
// ============================================================================

/// A tag attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tag {
    /// Tag id.
    pub id: String,
    /// Tag text.
    pub tag: String,
}

/// A comment attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Comment {
    /// Comment id.
    pub id: String,
    /// Comment text.
    pub content: String,
}

/// Collection response envelope.
#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    /// Collection body.
    list: ListBody<T>,
}

/// Collection body.
#[derive(Debug, Deserialize)]
struct ListBody<T> {
    /// Paging state of this page.
    #[serde(default)]
    pagination: Pagination,
    /// Entries in server order.
    #[serde(default = "Vec::new")]
    entries: Vec<EntryEnvelope<T>>,
}

/// Paging state reported with every collection page.
#[derive(Debug, Default, Deserialize)]
struct Pagination {
    /// True when another page follows.
    #[serde(rename = "hasMoreItems", default)]
    has_more_items: bool,
}

/// Single entry envelope.
#[derive(Debug, Deserialize)]
struct EntryEnvelope<T> {
    /// Entry body.
    entry: T,
}

/// Rating entry.
#[derive(Debug, Deserialize)]
struct Rating {
    /// Aggregate across all raters.
    #[serde(default)]
    aggregate: RatingAggregate,
}

/// Rating aggregate.
#[derive(Debug, Default, Deserialize)]
struct RatingAggregate {
    /// Number of ratings recorded.
    #[serde(rename = "numberOfRatings", default)]
    number_of_ratings: u64,
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Social metadata fixture operations.
#[derive(Debug, Clone)]
pub struct SocialService {
    /// HTTP executor.
    client: HttpClient,
}

impl SocialService {
    /// Creates the service over an HTTP client.
    #[must_use]
    pub const fn new(client: HttpClient) -> Self {
        Self {
            client,
        }
    }

    // ------------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------------

    /// Adds a tag to a node. Returns `false` when the node does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn add_tag(
        &self,
        credentials: &Credentials,
        node: &NodeRef,
        tag: &str,
    ) -> Result<bool, DataPrepError> {
        require_value(node.as_str(), "node ref")?;
        require_value(tag, "tag")?;
        let url = self.client.endpoint(PUBLIC_API_PATH, &["nodes", node.as_str(), "tags"])?;
        let request = RestRequest::post("add tag", url).json(json!([{ "tag": tag }]));
        self.client.execute(credentials, request)?.into_outcome(&[201], &[404])
    }

    /// Lists the tags on a node.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn tags(&self, credentials: &Credentials, node: &NodeRef) -> Result<Vec<Tag>, DataPrepError> {
        self.list(credentials, node, "tags", "list tags")
    }

    /// Removes a tag by text. Returns `false` when the node has no such tag.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when a request fails or is rejected.
    pub fn remove_tag(
        &self,
        credentials: &Credentials,
        node: &NodeRef,
        tag: &str,
    ) -> Result<bool, DataPrepError> {
        require_value(tag, "tag")?;
        let wanted = fold_name(tag);
        let found = self.tags(credentials, node)?.into_iter().find(|entry| fold_name(&entry.tag) == wanted);
        let Some(found) = found else {
            warn!(node = %node, tag, "tag not present on node");
            return Ok(false);
        };
        self.remove_entry(credentials, node, "tags", &found.id, "remove tag")
    }

    // ------------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------------

    /// Adds a comment to a node. Returns `false` when the node does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn add_comment(
        &self,
        credentials: &Credentials,
        node: &NodeRef,
        content: &str,
    ) -> Result<bool, DataPrepError> {
        require_value(node.as_str(), "node ref")?;
        require_value(content, "comment")?;
        let url = self.client.endpoint(PUBLIC_API_PATH, &["nodes", node.as_str(), "comments"])?;
        let request = RestRequest::post("add comment", url).json(json!({ "content": content }));
        self.client.execute(credentials, request)?.into_outcome(&[201], &[404])
    }

    /// Lists the comments on a node.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn comments(
        &self,
        credentials: &Credentials,
        node: &NodeRef,
    ) -> Result<Vec<Comment>, DataPrepError> {
        self.list(credentials, node, "comments", "list comments")
    }

    /// Removes the first comment whose text equals `content`.
    ///
    /// Returns `false` when no comment matches.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when a request fails or is rejected.
    pub fn remove_comment(
        &self,
        credentials: &Credentials,
        node: &NodeRef,
        content: &str,
    ) -> Result<bool, DataPrepError> {
        require_value(content, "comment")?;
        let found = self.comments(credentials, node)?.into_iter().find(|entry| entry.content == content);
        let Some(found) = found else {
            warn!(node = %node, "comment not present on node");
            return Ok(false);
        };
        self.remove_entry(credentials, node, "comments", &found.id, "remove comment")
    }

    // ------------------------------------------------------------------------
    // Likes
    // ------------------------------------------------------------------------

    /// Likes a node as the calling user. Returns `false` when the node does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn like(&self, credentials: &Credentials, node: &NodeRef) -> Result<bool, DataPrepError> {
        require_value(node.as_str(), "node ref")?;
        let url = self.client.endpoint(PUBLIC_API_PATH, &["nodes", node.as_str(), "ratings"])?;
        let request = RestRequest::post("like node", url).json(json!({
            "id": LIKES_SCHEME,
            "myRating": true,
        }));
        self.client.execute(credentials, request)?.into_outcome(&[201], &[404])
    }

    /// Returns the number of likes on a node.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn like_count(&self, credentials: &Credentials, node: &NodeRef) -> Result<u64, DataPrepError> {
        require_value(node.as_str(), "node ref")?;
        let url = self
            .client
            .endpoint(PUBLIC_API_PATH, &["nodes", node.as_str(), "ratings", LIKES_SCHEME])?;
        let response =
            self.client.execute(credentials, RestRequest::get("count likes", url))?.require_status(&[200])?;
        let rating: EntryEnvelope<Rating> = response.json()?;
        Ok(rating.entry.aggregate.number_of_ratings)
    }

    /// Removes the calling user's like. Returns `false` when there was none.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn unlike(&self, credentials: &Credentials, node: &NodeRef) -> Result<bool, DataPrepError> {
        self.remove_entry(credentials, node, "ratings", LIKES_SCHEME, "unlike node")
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Lists every entry of one sub-collection of a node, following pagination.
    fn list<T: DeserializeOwned>(
        &self,
        credentials: &Credentials,
        node: &NodeRef,
        collection: &str,
        operation: &str,
    ) -> Result<Vec<T>, DataPrepError> {
        require_value(node.as_str(), "node ref")?;
        let page_size = LIST_PAGE_SIZE.to_string();
        let mut items = Vec::new();
        let mut skip_count = 0_usize;
        loop {
            let mut url =
                self.client.endpoint(PUBLIC_API_PATH, &["nodes", node.as_str(), collection])?;
            url.query_pairs_mut()
                .append_pair("skipCount", &skip_count.to_string())
                .append_pair("maxItems", &page_size);
            let response = self
                .client
                .execute(credentials, RestRequest::get(operation, url))?
                .require_status(&[200])?;
            let envelope: ListEnvelope<T> = response.json()?;
            let ListBody {
                pagination,
                entries,
            } = envelope.list;
            let fetched = entries.len();
            items.extend(entries.into_iter().map(|entry| entry.entry));
            if !pagination.has_more_items || fetched == 0 {
                break;
            }
            skip_count += fetched;
        }
        Ok(items)
    }

    /// Deletes one entry of a node sub-collection.
    fn remove_entry(
        &self,
        credentials: &Credentials,
        node: &NodeRef,
        collection: &str,
        entry_id: &str,
        operation: &str,
    ) -> Result<bool, DataPrepError> {
        require_value(node.as_str(), "node ref")?;
        let url =
            self.client.endpoint(PUBLIC_API_PATH, &["nodes", node.as_str(), collection, entry_id])?;
        self.client
            .execute(credentials, RestRequest::delete(operation, url))?
            .into_outcome(&[204], &[404])
    }
}
