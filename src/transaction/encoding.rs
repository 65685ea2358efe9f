//! Canonical msgpack encoding of transactions
//!
//! The chain hashes and verifies the exact bytes, so encoding follows the
//! canonical rules: map keys in lexicographic order, zero / empty fields
//! omitted, integers in their smallest representation.

use data_encoding::BASE32_NOPAD;
use std::collections::BTreeMap;

use super::{Transaction, TransactionKind};
use crate::common::address::sha512_256;
use crate::common::{SwapError, SwapResult};
use crate::constants::{TX_GROUP_PREFIX, TX_ID_PREFIX};

enum Field<'a> {
    Uint(u64),
    /// Variable-length bytes, omitted only when empty
    Bytes(&'a [u8]),
    /// Fixed-size value (address, hash, signature), omitted when all zero
    Fixed(&'a [u8]),
    Str(&'a str),
    BytesList(&'a [Vec<u8>]),
    UintList(&'a [u64]),
    Map(BTreeMap<&'static str, Field<'a>>),
}

impl Field<'_> {
    fn is_empty(&self) -> bool {
        match self {
            Field::Uint(v) => *v == 0,
            Field::Bytes(b) => b.is_empty(),
            Field::Fixed(b) => b.iter().all(|&x| x == 0),
            Field::Str(s) => s.is_empty(),
            Field::BytesList(list) => list.is_empty(),
            Field::UintList(list) => list.is_empty(),
            Field::Map(map) => map.is_empty(),
        }
    }
}

fn enc_err(e: impl std::fmt::Display) -> SwapError {
    SwapError::Encoding(e.to_string())
}

/// Fixed-width big-endian u64, the way the contract reads numeric arguments
pub fn encode_uint64(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

fn transaction_fields(txn: &Transaction) -> BTreeMap<&'static str, Field<'_>> {
    let mut fields = BTreeMap::new();
    fields.insert("fee", Field::Uint(txn.fee));
    fields.insert("fv", Field::Uint(txn.first_valid));
    fields.insert("lv", Field::Uint(txn.last_valid));
    fields.insert("gen", Field::Str(&txn.genesis_id));
    fields.insert("gh", Field::Fixed(&txn.genesis_hash));
    fields.insert("note", Field::Bytes(&txn.note));
    fields.insert("snd", Field::Fixed(txn.sender.as_bytes()));
    fields.insert("type", Field::Str(txn.type_tag()));
    if let Some(group) = &txn.group {
        fields.insert("grp", Field::Fixed(group));
    }

    match &txn.kind {
        TransactionKind::Payment { receiver, amount } => {
            fields.insert("rcv", Field::Fixed(receiver.as_bytes()));
            fields.insert("amt", Field::Uint(*amount));
        }
        TransactionKind::AssetTransfer { asset_id, receiver, amount } => {
            fields.insert("xaid", Field::Uint(*asset_id));
            fields.insert("arcv", Field::Fixed(receiver.as_bytes()));
            fields.insert("aamt", Field::Uint(*amount));
        }
        TransactionKind::ApplicationCall { app_id, on_complete, args, foreign_assets } => {
            fields.insert("apid", Field::Uint(*app_id));
            fields.insert("apan", Field::Uint(*on_complete as u64));
            fields.insert("apaa", Field::BytesList(args));
            fields.insert("apas", Field::UintList(foreign_assets));
        }
    }

    fields.retain(|_, field| !field.is_empty());
    fields
}

fn write_map(buf: &mut Vec<u8>, map: &BTreeMap<&'static str, Field<'_>>) -> SwapResult<()> {
    rmp::encode::write_map_len(buf, map.len() as u32).map_err(enc_err)?;
    for (key, field) in map {
        rmp::encode::write_str(buf, key).map_err(enc_err)?;
        write_field(buf, field)?;
    }
    Ok(())
}

fn write_field(buf: &mut Vec<u8>, field: &Field<'_>) -> SwapResult<()> {
    match field {
        Field::Uint(v) => {
            rmp::encode::write_uint(buf, *v).map_err(enc_err)?;
        }
        Field::Bytes(b) | Field::Fixed(b) => rmp::encode::write_bin(buf, b).map_err(enc_err)?,
        Field::Str(s) => rmp::encode::write_str(buf, s).map_err(enc_err)?,
        Field::BytesList(list) => {
            rmp::encode::write_array_len(buf, list.len() as u32).map_err(enc_err)?;
            for item in list.iter() {
                rmp::encode::write_bin(buf, item).map_err(enc_err)?;
            }
        }
        Field::UintList(list) => {
            rmp::encode::write_array_len(buf, list.len() as u32).map_err(enc_err)?;
            for item in list.iter() {
                rmp::encode::write_uint(buf, *item).map_err(enc_err)?;
            }
        }
        Field::Map(map) => write_map(buf, map)?,
    }
    Ok(())
}

pub fn encode_transaction(txn: &Transaction) -> SwapResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(256);
    write_map(&mut buf, &transaction_fields(txn))?;
    Ok(buf)
}

/// Encode a signed transaction: `{"sig": <64 bytes>, "txn": {...}}`
pub fn encode_signed_transaction(txn: &Transaction, signature: &[u8; 64]) -> SwapResult<Vec<u8>> {
    let mut envelope = BTreeMap::new();
    envelope.insert("sig", Field::Fixed(signature));
    envelope.insert("txn", Field::Map(transaction_fields(txn)));
    let mut buf = Vec::with_capacity(320);
    write_map(&mut buf, &envelope)?;
    Ok(buf)
}

pub(crate) fn raw_transaction_id(txn: &Transaction) -> SwapResult<[u8; 32]> {
    let encoded = encode_transaction(txn)?;
    Ok(sha512_256(&[TX_ID_PREFIX, &encoded]))
}

/// Base32 transaction id, 52 characters
pub fn transaction_id(txn: &Transaction) -> SwapResult<String> {
    Ok(BASE32_NOPAD.encode(&raw_transaction_id(txn)?))
}

/// Group id over the ids of the members, each hashed without a group set
pub fn compute_group_id(transactions: &[Transaction]) -> SwapResult<[u8; 32]> {
    if transactions.is_empty() {
        return Err(SwapError::Encoding("cannot group zero transactions".into()));
    }

    let mut ids = Vec::with_capacity(transactions.len());
    for txn in transactions {
        let mut ungrouped = txn.clone();
        ungrouped.group = None;
        ids.push(raw_transaction_id(&ungrouped)?.to_vec());
    }

    let mut txlist = BTreeMap::new();
    txlist.insert("txlist", Field::BytesList(&ids));
    let mut buf = Vec::with_capacity(8 + ids.len() * 34);
    write_map(&mut buf, &txlist)?;
    Ok(sha512_256(&[TX_GROUP_PREFIX, &buf]))
}

/// Compute and stamp the shared group id on every member
pub fn assign_group_id(transactions: &mut [Transaction]) -> SwapResult<[u8; 32]> {
    let group_id = compute_group_id(transactions)?;
    for txn in transactions.iter_mut() {
        txn.group = Some(group_id);
    }
    tracing::debug!(group = %hex::encode(group_id), size = transactions.len(), "assigned group id");
    Ok(group_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Address;
    use crate::transaction::OnComplete;

    fn sample(kind: TransactionKind) -> Transaction {
        Transaction {
            sender: Address::new([1u8; 32]),
            fee: 1_000,
            first_valid: 100,
            last_valid: 1_100,
            genesis_id: "testnet-v1.0".into(),
            genesis_hash: [2u8; 32],
            note: Vec::new(),
            group: None,
            kind,
        }
    }

    #[test]
    fn test_uint64_is_big_endian_fixed_width() {
        assert_eq!(encode_uint64(111), vec![0, 0, 0, 0, 0, 0, 0, 111]);
        assert_eq!(encode_uint64(0x0102), vec![0, 0, 0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_zero_fields_are_omitted() {
        let opt_in = sample(TransactionKind::AssetTransfer {
            asset_id: 31566704,
            receiver: Address::new([1u8; 32]),
            amount: 0,
        });
        let fields = transaction_fields(&opt_in);
        assert!(!fields.contains_key("aamt"));
        assert!(!fields.contains_key("note"));
        assert!(!fields.contains_key("grp"));
        assert!(fields.contains_key("xaid"));
        assert!(fields.contains_key("arcv"));
    }

    #[test]
    fn test_keys_are_sorted() {
        let call = sample(TransactionKind::ApplicationCall {
            app_id: 99,
            on_complete: OnComplete::DeleteApplication,
            args: vec![b"cancel".to_vec()],
            foreign_assets: vec![31566704],
        });
        let keys: Vec<_> = transaction_fields(&call).keys().copied().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.first(), Some(&"apaa"));
    }

    #[test]
    fn test_noop_on_complete_is_omitted() {
        let call = sample(TransactionKind::ApplicationCall {
            app_id: 99,
            on_complete: OnComplete::NoOp,
            args: vec![],
            foreign_assets: vec![],
        });
        let fields = transaction_fields(&call);
        assert!(!fields.contains_key("apan"));
        assert!(!fields.contains_key("apaa"));
        assert!(!fields.contains_key("apas"));
    }

    #[test]
    fn test_encoding_starts_with_fixmap() {
        let pay = sample(TransactionKind::Payment { receiver: Address::new([3u8; 32]), amount: 5 });
        let bytes = encode_transaction(&pay).unwrap();
        // fee, fv, gen, gh, lv, snd, type, rcv, amt
        assert_eq!(bytes[0], 0x80 | 9);
    }

    #[test]
    fn test_transaction_id_shape() {
        let pay = sample(TransactionKind::Payment { receiver: Address::new([3u8; 32]), amount: 5 });
        let id = transaction_id(&pay).unwrap();
        assert_eq!(id.len(), crate::constants::TX_ID_LEN);
        assert_eq!(id, transaction_id(&pay.clone()).unwrap());
    }

    #[test]
    fn test_group_id_ignores_existing_group() {
        let a = sample(TransactionKind::Payment { receiver: Address::new([3u8; 32]), amount: 5 });
        let b = sample(TransactionKind::Payment { receiver: Address::new([4u8; 32]), amount: 6 });
        let first = compute_group_id(&[a.clone(), b.clone()]).unwrap();

        let mut grouped = vec![a, b];
        let assigned = assign_group_id(&mut grouped).unwrap();
        assert_eq!(first, assigned);
        assert_eq!(compute_group_id(&grouped).unwrap(), first);
        assert!(grouped.iter().all(|t| t.group == Some(first)));
    }

    #[test]
    fn test_group_order_matters() {
        let a = sample(TransactionKind::Payment { receiver: Address::new([3u8; 32]), amount: 5 });
        let b = sample(TransactionKind::Payment { receiver: Address::new([4u8; 32]), amount: 6 });
        assert_ne!(
            compute_group_id(&[a.clone(), b.clone()]).unwrap(),
            compute_group_id(&[b, a]).unwrap()
        );
    }

    #[test]
    fn test_empty_group_rejected() {
        assert!(compute_group_id(&[]).is_err());
    }

    // Reference vectors: testnet genesis, round 41_000_000, 1000 microAlgo fee
    fn testnet_header(sender: u8, kind: TransactionKind) -> Transaction {
        use base64::Engine;
        let genesis_hash = base64::engine::general_purpose::STANDARD
            .decode("SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=")
            .unwrap();
        Transaction {
            sender: Address::new([sender; 32]),
            fee: 1_000,
            first_valid: 41_000_000,
            last_valid: 41_001_000,
            genesis_id: "testnet-v1.0".into(),
            genesis_hash: genesis_hash.try_into().unwrap(),
            note: Vec::new(),
            group: None,
            kind,
        }
    }

    fn reference_payment() -> Transaction {
        let mut pay = testnet_header(
            0x11,
            TransactionKind::Payment { receiver: Address::new([0x22; 32]), amount: 1_500_000 },
        );
        pay.note = b"donation".to_vec();
        pay
    }

    fn reference_opt_in() -> Transaction {
        testnet_header(
            0x33,
            TransactionKind::AssetTransfer {
                asset_id: 31566704,
                receiver: Address::new([0x33; 32]),
                amount: 0,
            },
        )
    }

    #[test]
    fn test_payment_matches_reference_vector() {
        let pay = reference_payment();
        assert_eq!(
            hex::encode(encode_transaction(&pay).unwrap()),
            "8aa3616d74ce0016e360a3666565cd03e8a26676ce02719c40a367656eac746573746e65742d76312e30\
             a26768c4204863b518a4b3c84ec810f22d4f1081cb0f71f059a7ac20dec62f7f70e5093a22a26c76ce02\
             71a028a46e6f7465c408646f6e6174696f6ea3726376c42022222222222222222222222222222222222222\
             22222222222222222222222222a3736e64c420111111111111111111111111111111111111111111111111\
             1111111111111111a474797065a3706179"
        );
        assert_eq!(transaction_id(&pay).unwrap(), "IPXW635KTCJJ3FX2YDCPRLNTOJH2KGIM2QZ2AFUDCTNJ2HLRLP5A");
    }

    #[test]
    fn test_opt_in_matches_reference_vector() {
        let opt_in = reference_opt_in();
        assert_eq!(
            hex::encode(encode_transaction(&opt_in).unwrap()),
            "89a461726376c4203333333333333333333333333333333333333333333333333333333333333333a366\
             6565cd03e8a26676ce02719c40a367656eac746573746e65742d76312e30a26768c4204863b518a4b3c8\
             4ec810f22d4f1081cb0f71f059a7ac20dec62f7f70e5093a22a26c76ce0271a028a3736e64c42033333333\
             33333333333333333333333333333333333333333333333333333333a474797065a56178666572a47861\
             6964ce01e1ab70"
        );
        assert_eq!(transaction_id(&opt_in).unwrap(), "S3LGQJJ53UIOIZQMI467IJVHWOQLLMQZUOQKCR3AEN36WSEPFZGA");
    }

    #[test]
    fn test_group_matches_reference_vector() {
        let mut group = vec![reference_payment(), reference_opt_in()];
        let group_id = assign_group_id(&mut group).unwrap();
        assert_eq!(
            hex::encode(group_id),
            "87ec94264fb4c774f3f5988633b632a60175fef1ac591a40077119da94fd33b0"
        );
        // members hash with the group field set once assigned
        assert_eq!(
            transaction_id(&group[0]).unwrap(),
            "Q5KWPGM6JEGLQRX7XSRSHQA5EVVGX6CV5FHK2BHSZIMQW3FJSDFQ"
        );
    }

    #[test]
    fn test_create_call_matches_reference_vector() {
        let call = testnet_header(
            0x33,
            TransactionKind::ApplicationCall {
                app_id: 4242,
                on_complete: OnComplete::NoOp,
                args: vec![
                    b"create".to_vec(),
                    encode_uint64(111),
                    encode_uint64(100),
                    encode_uint64(222),
                    encode_uint64(50),
                ],
                foreign_assets: vec![111],
            },
        );
        assert_eq!(transaction_id(&call).unwrap(), "JRHB2UESRKYYEOFG2JINT2AEDD3UGRQTRWVW4OOIKOOHF6WW55OA");
    }

    #[test]
    fn test_zero_filled_note_is_kept() {
        let mut pay = reference_payment();
        pay.note = vec![0; 4];
        assert!(transaction_fields(&pay).contains_key("note"));
        assert_eq!(transaction_id(&pay).unwrap(), "TZHMT5V4MXPVU2V25YP3SZPUIG74OGFXMULJLGFRXCXI3GO5476A");

        pay.note.clear();
        assert!(!transaction_fields(&pay).contains_key("note"));
    }

    #[test]
    fn test_signed_envelope() {
        let pay = sample(TransactionKind::Payment { receiver: Address::new([3u8; 32]), amount: 5 });
        let signed = encode_signed_transaction(&pay, &[9u8; 64]).unwrap();
        // fixmap of two entries, first key "sig"
        assert_eq!(signed[0], 0x82);
        assert_eq!(&signed[1..5], &[0xa3, b's', b'i', b'g']);
        assert!(signed.len() > encode_transaction(&pay).unwrap().len() + 64);
    }
}
