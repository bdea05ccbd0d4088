use anyhow::Context;

pub mod config;
pub mod errors;
pub mod fanout;
pub mod git;
pub mod github;
pub mod issue_links;
pub mod logger;
pub mod messages;
pub mod notifier;
pub mod release_graph;
pub mod run;
mod utils;


/// Deserializes a JSON response body, naming the path of the field that
/// failed when it doesn't match `T`.
pub fn deserialize_payload<T: serde::de::DeserializeOwned>(v: &[u8]) -> anyhow::Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(v);
    let res: Result<T, _> = serde_path_to_error::deserialize(&mut deserializer);
    match res {
        Ok(r) => Ok(r),
        Err(e) => {
            let ctx = format!("at {:?}", e.path());
            Err(e.into_inner()).context(ctx)
        }
    }
}
