//! Status bytes for the viewer and worker wire dialects.
//!
//! The two dialects have separate status-code spaces that overlap
//! numerically (`0x00` means Accept to a viewer but Request from a worker).
//! They are kept as distinct types so one can never be read as the other.
//! All multi-byte integers on the wire are little-endian, and every message
//! that carries a chunk address uses the fixed 12-byte layout from
//! [`crate::chunk_address`].

use crate::error::{Error, Result};

/// Status byte of a viewer-session reply.
///
/// On `Accept` the reply continues with a u32 length prefix and that many
/// bytes of tag-prefixed encoded chunk; the other statuses end the exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerStatus {
    Accept,
    Reject,
    NotAvailable,
}

impl ViewerStatus {
    pub fn as_byte(self) -> u8 {
        match self {
            ViewerStatus::Accept => 0x00,
            ViewerStatus::Reject => 0x01,
            ViewerStatus::NotAvailable => 0x02,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(ViewerStatus::Accept),
            0x01 => Ok(ViewerStatus::Reject),
            0x02 => Ok(ViewerStatus::NotAvailable),
            other => Err(Error::Protocol(format!(
                "unknown viewer status byte {other:#04x}"
            ))),
        }
    }
}

/// First byte of a worker session, naming which exchange follows: a pull
/// (`Request`) or a push (`Response`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerMessageTag {
    Request,
    Response,
}

impl WorkerMessageTag {
    pub fn as_byte(self) -> u8 {
        match self {
            WorkerMessageTag::Request => 0x00,
            WorkerMessageTag::Response => 0x01,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(WorkerMessageTag::Request),
            0x01 => Ok(WorkerMessageTag::Response),
            other => Err(Error::Protocol(format!(
                "unknown worker message tag {other:#04x}"
            ))),
        }
    }
}

/// Reply to a worker's pull exchange. On `Available` the reply continues
/// with a 12-byte workload descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkloadReply {
    Available,
    NotAvailable,
}

impl WorkloadReply {
    pub fn as_byte(self) -> u8 {
        match self {
            WorkloadReply::Available => 0x10,
            WorkloadReply::NotAvailable => 0x11,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x10 => Ok(WorkloadReply::Available),
            0x11 => Ok(WorkloadReply::NotAvailable),
            other => Err(Error::Protocol(format!(
                "unknown workload reply byte {other:#04x}"
            ))),
        }
    }
}

/// Reply to a worker's push exchange. Only after `Accept` does the worker
/// stream the raw chunk bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionReply {
    Accept,
    Reject,
}

impl SubmissionReply {
    pub fn as_byte(self) -> u8 {
        match self {
            SubmissionReply::Accept => 0x20,
            SubmissionReply::Reject => 0x21,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x20 => Ok(SubmissionReply::Accept),
            0x21 => Ok(SubmissionReply::Reject),
            other => Err(Error::Protocol(format!(
                "unknown submission reply byte {other:#04x}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_status_bytes_roundtrip() {
        for status in [
            ViewerStatus::Accept,
            ViewerStatus::Reject,
            ViewerStatus::NotAvailable,
        ] {
            assert_eq!(ViewerStatus::from_byte(status.as_byte()).unwrap(), status);
        }
    }

    #[test]
    fn worker_domain_bytes_roundtrip() {
        for tag in [WorkerMessageTag::Request, WorkerMessageTag::Response] {
            assert_eq!(WorkerMessageTag::from_byte(tag.as_byte()).unwrap(), tag);
        }
        for reply in [WorkloadReply::Available, WorkloadReply::NotAvailable] {
            assert_eq!(WorkloadReply::from_byte(reply.as_byte()).unwrap(), reply);
        }
        for reply in [SubmissionReply::Accept, SubmissionReply::Reject] {
            assert_eq!(SubmissionReply::from_byte(reply.as_byte()).unwrap(), reply);
        }
    }

    #[test]
    fn unknown_bytes_are_protocol_violations() {
        assert!(matches!(
            ViewerStatus::from_byte(0x03),
            Err(Error::Protocol(_))
        ));
        assert!(matches!(
            WorkerMessageTag::from_byte(0x10),
            Err(Error::Protocol(_))
        ));
        assert!(matches!(
            WorkloadReply::from_byte(0x00),
            Err(Error::Protocol(_))
        ));
        assert!(matches!(
            SubmissionReply::from_byte(0x11),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn status_spaces_match_the_wire_contract() {
        assert_eq!(ViewerStatus::Accept.as_byte(), 0x00);
        assert_eq!(ViewerStatus::Reject.as_byte(), 0x01);
        assert_eq!(ViewerStatus::NotAvailable.as_byte(), 0x02);
        assert_eq!(WorkerMessageTag::Request.as_byte(), 0x00);
        assert_eq!(WorkerMessageTag::Response.as_byte(), 0x01);
        assert_eq!(WorkloadReply::Available.as_byte(), 0x10);
        assert_eq!(WorkloadReply::NotAvailable.as_byte(), 0x11);
        assert_eq!(SubmissionReply::Accept.as_byte(), 0x20);
        assert_eq!(SubmissionReply::Reject.as_byte(), 0x21);
    }
}
