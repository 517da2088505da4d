use flatledger_core::Transaction;

/// Lowercase haystack the incoming/outgoing person matchers search:
/// description plus every normalized supplementary field. The payload
/// itself is never inspected here; normalization happened at ingestion.
pub fn search_corpus(tx: &Transaction) -> String {
    let supp = &tx.supplementary;
    let mut parts: Vec<&str> = vec![tx.description.as_str()];
    for field in [
        supp.particulars.as_deref(),
        supp.code.as_deref(),
        supp.reference.as_deref(),
        supp.counterparty_account.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        parts.push(field);
    }
    parts.join(" ").to_lowercase()
}
