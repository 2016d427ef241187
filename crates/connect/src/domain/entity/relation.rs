use app_core::graph::{GraphFriend, GraphLike};
use app_core::time::parse_graph_time;
use chrono::{DateTime, FixedOffset};

#[derive(Debug, Clone, PartialEq)]
pub struct FacebookLike {
    pub facebook_id: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub created_time: Option<DateTime<FixedOffset>>,
}

impl From<GraphLike> for FacebookLike {
    fn from(like: GraphLike) -> Self {
        Self {
            created_time: like.created_time.as_deref().and_then(parse_graph_time),
            facebook_id: like.id,
            name: like.name,
            category: like.category,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacebookFriend {
    pub facebook_id: String,
    pub name: Option<String>,
}

impl From<GraphFriend> for FacebookFriend {
    fn from(friend: GraphFriend) -> Self {
        Self { facebook_id: friend.id, name: friend.name }
    }
}
