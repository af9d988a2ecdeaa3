use colored::Colorize;
use tabled::builder::Builder;
use tabled::settings::Style;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokenkeep::TokenRecord;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_record(record: &TokenRecord) {
    println!("{}", record_table(record));
    println!("{}", "Claims:".cyan());
    println!(
        "{}",
        serde_json::to_string_pretty(&record.claims).unwrap_or_else(|_| record.claims.to_string())
    );
}

fn record_table(record: &TokenRecord) -> String {
    let exp = record
        .exp
        .map(|exp| exp.to_string())
        .unwrap_or_else(|| "-".to_string());
    let jwt = elide(&record.jwt);
    let created = timestamp(record.created_at);
    let updated = timestamp(record.updated_at);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    builder.push_record(["jti", record.jti.as_str()]);
    builder.push_record(["aud", or_dash(&record.aud)]);
    builder.push_record(["typ", or_dash(&record.typ)]);
    builder.push_record(["iss", or_dash(&record.iss)]);
    builder.push_record(["sub", or_dash(&record.sub)]);
    builder.push_record(["exp", exp.as_str()]);
    builder.push_record(["jwt", jwt.as_str()]);
    builder.push_record(["created", created.as_str()]);
    builder.push_record(["updated", updated.as_str()]);
    builder.build().with(Style::rounded()).to_string()
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

/// Keeps only the JOSE header segment of the token.
fn elide(jwt: &str) -> String {
    match jwt.split_once('.') {
        Some((header, _)) => format!("{header}.… ({} bytes)", jwt.len()),
        None => format!("… ({} bytes)", jwt.len()),
    }
}

fn timestamp(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenkeep::TokenClaims;

    #[test]
    fn test_elide_keeps_only_header() {
        assert_eq!(elide("aGVhZGVy.cGF5bG9hZA.c2ln"), "aGVhZGVy.… (24 bytes)");
        assert_eq!(elide("opaque"), "… (6 bytes)");
    }

    #[test]
    fn test_record_table_hides_token_body() {
        let claims = TokenClaims::builder()
            .jti("abc123")
            .audience("web")
            .subject("user:1")
            .build();
        let record = TokenRecord::from_claims(&claims, "aGVhZGVy.c2VjcmV0LXBheWxvYWQ.c2ln").unwrap();

        let table = record_table(&record);
        assert!(table.contains("abc123"));
        assert!(table.contains("user:1"));
        assert!(!table.contains("c2VjcmV0LXBheWxvYWQ"));
    }
}
