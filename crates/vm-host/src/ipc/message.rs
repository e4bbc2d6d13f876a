//! The 8-byte framing header and the message-kind catalogue.

use thiserror::Error;

/// Length in bytes of the framing header: little-endian payload length
/// followed by little-endian message kind.
pub const MESSAGE_HEADER_LEN: usize = 8;

/// Errors raised while framing or unframing a message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// The kind value is outside the catalogue.
    #[error("undefined message kind: {0}")]
    UndefinedKind(u32),

    /// The header bytes are shorter than a full header.
    #[error("truncated message header")]
    TruncatedHeader,

    /// The payload is shorter than the header's declared length.
    #[error("truncated message payload")]
    TruncatedPayload,

    /// The payload failed to (de)serialize.
    #[error("message codec error: {0}")]
    Codec(String),
}

// =============================================================================
// MESSAGE KINDS
// =============================================================================

/// Every message that may cross the pipe: session control, contract
/// requests/responses, and one request/response pair per hook method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
#[allow(missing_docs)]
pub enum MessageKind {
    Initialize = 0,
    Stop = 1,
    ContractDeployRequest = 2,
    ContractCallRequest = 3,
    ContractResponse = 4,
    DiagnoseWaitRequest = 5,
    DiagnoseWaitResponse = 6,
    BlockchainNewAddressRequest = 7,
    BlockchainNewAddressResponse = 8,
    BlockchainGetStorageDataRequest = 9,
    BlockchainGetStorageDataResponse = 10,
    BlockchainGetBlockhashRequest = 11,
    BlockchainGetBlockhashResponse = 12,
    BlockchainLastNonceRequest = 13,
    BlockchainLastNonceResponse = 14,
    BlockchainLastRoundRequest = 15,
    BlockchainLastRoundResponse = 16,
    BlockchainLastTimeStampRequest = 17,
    BlockchainLastTimeStampResponse = 18,
    BlockchainLastRandomSeedRequest = 19,
    BlockchainLastRandomSeedResponse = 20,
    BlockchainLastEpochRequest = 21,
    BlockchainLastEpochResponse = 22,
    BlockchainGetStateRootHashRequest = 23,
    BlockchainGetStateRootHashResponse = 24,
    BlockchainCurrentNonceRequest = 25,
    BlockchainCurrentNonceResponse = 26,
    BlockchainCurrentRoundRequest = 27,
    BlockchainCurrentRoundResponse = 28,
    BlockchainCurrentTimeStampRequest = 29,
    BlockchainCurrentTimeStampResponse = 30,
    BlockchainCurrentRandomSeedRequest = 31,
    BlockchainCurrentRandomSeedResponse = 32,
    BlockchainCurrentEpochRequest = 33,
    BlockchainCurrentEpochResponse = 34,
    BlockchainProcessBuiltinFunctionRequest = 35,
    BlockchainProcessBuiltinFunctionResponse = 36,
    BlockchainGetBuiltinFunctionNamesRequest = 37,
    BlockchainGetBuiltinFunctionNamesResponse = 38,
    BlockchainGetAllStateRequest = 39,
    BlockchainGetAllStateResponse = 40,
    BlockchainGetUserAccountRequest = 41,
    BlockchainGetUserAccountResponse = 42,
    BlockchainGetShardOfAddressRequest = 43,
    BlockchainGetShardOfAddressResponse = 44,
    BlockchainIsSmartContractRequest = 45,
    BlockchainIsSmartContractResponse = 46,
}

impl MessageKind {
    /// Decodes a raw kind value, rejecting anything outside the catalogue.
    pub fn from_u32(value: u32) -> Result<Self, MessageError> {
        let kind = match value {
            0 => Self::Initialize,
            1 => Self::Stop,
            2 => Self::ContractDeployRequest,
            3 => Self::ContractCallRequest,
            4 => Self::ContractResponse,
            5 => Self::DiagnoseWaitRequest,
            6 => Self::DiagnoseWaitResponse,
            7 => Self::BlockchainNewAddressRequest,
            8 => Self::BlockchainNewAddressResponse,
            9 => Self::BlockchainGetStorageDataRequest,
            10 => Self::BlockchainGetStorageDataResponse,
            11 => Self::BlockchainGetBlockhashRequest,
            12 => Self::BlockchainGetBlockhashResponse,
            13 => Self::BlockchainLastNonceRequest,
            14 => Self::BlockchainLastNonceResponse,
            15 => Self::BlockchainLastRoundRequest,
            16 => Self::BlockchainLastRoundResponse,
            17 => Self::BlockchainLastTimeStampRequest,
            18 => Self::BlockchainLastTimeStampResponse,
            19 => Self::BlockchainLastRandomSeedRequest,
            20 => Self::BlockchainLastRandomSeedResponse,
            21 => Self::BlockchainLastEpochRequest,
            22 => Self::BlockchainLastEpochResponse,
            23 => Self::BlockchainGetStateRootHashRequest,
            24 => Self::BlockchainGetStateRootHashResponse,
            25 => Self::BlockchainCurrentNonceRequest,
            26 => Self::BlockchainCurrentNonceResponse,
            27 => Self::BlockchainCurrentRoundRequest,
            28 => Self::BlockchainCurrentRoundResponse,
            29 => Self::BlockchainCurrentTimeStampRequest,
            30 => Self::BlockchainCurrentTimeStampResponse,
            31 => Self::BlockchainCurrentRandomSeedRequest,
            32 => Self::BlockchainCurrentRandomSeedResponse,
            33 => Self::BlockchainCurrentEpochRequest,
            34 => Self::BlockchainCurrentEpochResponse,
            35 => Self::BlockchainProcessBuiltinFunctionRequest,
            36 => Self::BlockchainProcessBuiltinFunctionResponse,
            37 => Self::BlockchainGetBuiltinFunctionNamesRequest,
            38 => Self::BlockchainGetBuiltinFunctionNamesResponse,
            39 => Self::BlockchainGetAllStateRequest,
            40 => Self::BlockchainGetAllStateResponse,
            41 => Self::BlockchainGetUserAccountRequest,
            42 => Self::BlockchainGetUserAccountResponse,
            43 => Self::BlockchainGetShardOfAddressRequest,
            44 => Self::BlockchainGetShardOfAddressResponse,
            45 => Self::BlockchainIsSmartContractRequest,
            46 => Self::BlockchainIsSmartContractResponse,
            other => return Err(MessageError::UndefinedKind(other)),
        };
        Ok(kind)
    }
}

// =============================================================================
// MESSAGE HEADER
// =============================================================================

/// The decoded framing header preceding every payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageHeader {
    /// Payload length in bytes.
    pub length: u32,
    /// Payload kind.
    pub kind: MessageKind,
}

impl MessageHeader {
    /// Encodes the header as its 8-byte wire form.
    #[must_use]
    pub fn encode(&self) -> [u8; MESSAGE_HEADER_LEN] {
        let mut buffer = [0u8; MESSAGE_HEADER_LEN];
        buffer[0..4].copy_from_slice(&self.length.to_le_bytes());
        buffer[4..8].copy_from_slice(&(self.kind as u32).to_le_bytes());
        buffer
    }

    /// Decodes a header from wire bytes, rejecting unknown kinds.
    pub fn decode(bytes: &[u8]) -> Result<Self, MessageError> {
        if bytes.len() < MESSAGE_HEADER_LEN {
            return Err(MessageError::TruncatedHeader);
        }

        let length = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let raw_kind = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Ok(Self {
            length,
            kind: MessageKind::from_u32(raw_kind)?,
        })
    }
}

// =============================================================================
// PAYLOAD FRAMING
// =============================================================================

/// Frames a serializable payload under `kind`: 8-byte header followed by
/// the bincode-encoded payload.
pub fn encode_message<T: serde::Serialize>(
    kind: MessageKind,
    payload: &T,
) -> Result<Vec<u8>, MessageError> {
    let payload = bincode::serialize(payload).map_err(|err| MessageError::Codec(err.to_string()))?;
    let header = MessageHeader {
        length: payload.len() as u32,
        kind,
    };

    let mut message = Vec::with_capacity(MESSAGE_HEADER_LEN + payload.len());
    message.extend_from_slice(&header.encode());
    message.extend_from_slice(&payload);
    Ok(message)
}

/// Unframes a message, rejecting unknown kinds and truncated payloads.
pub fn decode_message<T: serde::de::DeserializeOwned>(
    bytes: &[u8],
) -> Result<(MessageKind, T), MessageError> {
    let header = MessageHeader::decode(bytes)?;
    let payload = &bytes[MESSAGE_HEADER_LEN..];
    if payload.len() < header.length as usize {
        return Err(MessageError::TruncatedPayload);
    }

    let payload = bincode::deserialize(&payload[..header.length as usize])
        .map_err(|err| MessageError::Codec(err.to_string()))?;
    Ok((header.kind, payload))
}

// =============================================================================
// TESTS
// =============================================================================
