use super::MapViewport;
use crate::models::BoundingBox;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

/// Publish one bounding box per `south,west,north,east` line until EOF.
///
/// Blank lines and `#` comments are ignored; malformed lines are logged and
/// skipped. Returns the number of boxes published.
pub async fn feed_bounds<R>(reader: R, viewport: &MapViewport) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut published = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.parse::<BoundingBox>() {
            Ok(bbox) => {
                debug!("Viewport moved to {}", bbox);
                viewport.set_bounds(bbox);
                published += 1;
            }
            Err(e) => warn!("Ignoring viewport line '{}': {}", line, e),
        }
    }

    Ok(published)
}
