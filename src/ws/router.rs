//! Inbound frame routing.
//!
//! Stateless dispatch by frame type: device commands are forwarded, device
//! results are relayed to viewers (read results after enrichment), and
//! name mutations go through the tag service before being announced.
//! Malformed or unrecognized frames are dropped with a debug log and no
//! reply; the connection stays open.

use crate::domain::{ConnId, ConnectionRegistry};
use crate::service::TagService;
use crate::ws::messages::{ClientFrame, ServerFrame};

/// Routes one inbound text frame from connection `origin`.
pub async fn route_frame(
    raw: &str,
    origin: ConnId,
    registry: &ConnectionRegistry,
    tags: &TagService,
) {
    let frame = match serde_json::from_str::<ClientFrame>(raw) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::debug!(conn_id = %origin, %err, "dropping unroutable frame");
            return;
        }
    };

    match frame {
        ClientFrame::DeviceAnnounce => registry.promote_to_device(origin).await,

        ClientFrame::ReadRequest { seq } => {
            let forwarded = ServerFrame::ReadRequest { seq }.to_json();
            forward_or_reject(registry, origin, &forwarded).await;
        }

        // Opaque commands: the original frame goes to the device untouched.
        ClientFrame::Config { .. }
        | ClientFrame::GetFw
        | ClientFrame::GetTemp
        | ClientFrame::GetReturnLoss => forward_or_reject(registry, origin, raw).await,

        ClientFrame::TagNameSet { id, name } => {
            let stored = tags.set_name(&id, &name).await;
            let update = ServerFrame::TagNameUpdated {
                id,
                name: stored.unwrap_or_default(),
            };
            registry.broadcast_to_viewers(&update.to_json()).await;
        }

        ClientFrame::ReadResult(mut result) => {
            tags.enrich(&mut result).await;
            registry
                .broadcast_to_viewers(&ServerFrame::ReadResult(result).to_json())
                .await;
        }

        // Ancillary device results are relayed verbatim.
        ClientFrame::FwResult { .. }
        | ClientFrame::TempResult { .. }
        | ClientFrame::ReturnLossResult { .. } => registry.broadcast_to_viewers(raw).await,
    }
}

/// Forwards a serialized frame to the device, replying with an error frame
/// to the requesting connection only when no device is available.
async fn forward_or_reject(registry: &ConnectionRegistry, origin: ConnId, json: &str) {
    if let Err(err) = registry.forward_to_device(json).await {
        tracing::debug!(conn_id = %origin, "command rejected, device offline");
        let reply = ServerFrame::Error {
            message: err.to_string(),
        };
        registry.send_to(origin, reply.to_json()).await;
    }
}
