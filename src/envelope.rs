use quick_xml::events::Event;
use serde_json::Value;

use crate::error::ReconcileError;
use crate::row::RawRow;
use crate::source::UpstreamResponse;

// Gateway reason codes / messages that mean the service key was refused.
const AUTH_REASON_CODES: &[&str] = &["20", "30", "31", "32"];
const AUTH_MESSAGES: &[&str] = &[
    "SERVICE_ACCESS_DENIED_ERROR",
    "SERVICE_KEY_IS_NOT_REGISTERED_ERROR",
    "DEADLINE_HAS_EXPIRED_ERROR",
    "UNREGISTERED_IP_ERROR",
];
const NO_DATA_CODE: &str = "03";

/// One decoded page: the reported total and the rows on this page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub total_count: u64,
    pub rows: Vec<RawRow>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.total_count < 1 && self.rows.is_empty()
    }
}

/// Turns a raw upstream response into a page, or classifies why it is not one.
pub fn decode(response: &UpstreamResponse) -> Result<Page, ReconcileError> {
    if matches!(response.status, 401 | 403) {
        return Err(ReconcileError::Auth(format!("HTTP {}", response.status)));
    }

    let body = response.body.trim();
    if let Some(reason) = auth_signature(body) {
        return Err(ReconcileError::Auth(reason));
    }
    if !response.is_success() {
        // A JSON error body may still carry an auth result code.
        if let Ok(value) = serde_json::from_str::<Value>(body) {
            if let Err(e @ ReconcileError::Auth(_)) = decode_json(&value) {
                return Err(e);
            }
        }
        return Err(ReconcileError::Http {
            status: response.status,
            body: snippet(body),
        });
    }

    let value: Value = serde_json::from_str(body).map_err(|e| {
        ReconcileError::MalformedResponse(format!("not JSON ({}): {}", e, snippet(body)))
    })?;
    decode_json(&value)
}

/// Decodes an already-parsed `{ response: { header, body } }` envelope.
pub fn decode_json(value: &Value) -> Result<Page, ReconcileError> {
    if let Some(code) = value
        .pointer("/response/header/resultCode")
        .and_then(scalar_text)
    {
        let msg = value
            .pointer("/response/header/resultMsg")
            .and_then(scalar_text)
            .unwrap_or_default();
        match code.as_str() {
            "00" | "0" | "000" => {}
            NO_DATA_CODE => return Ok(Page::default()),
            c if AUTH_REASON_CODES.contains(&c) => {
                return Err(ReconcileError::Auth(format!("resultCode {}: {}", c, msg)));
            }
            c => {
                return Err(ReconcileError::MalformedResponse(format!(
                    "resultCode {}: {}",
                    c, msg
                )));
            }
        }
    }

    let body = value
        .pointer("/response/body")
        .ok_or_else(|| ReconcileError::MalformedResponse("missing response.body".into()))?;

    Ok(Page {
        total_count: body.get("totalCount").map(parse_count).unwrap_or(0),
        rows: items(body),
    })
}

fn items(body: &Value) -> Vec<RawRow> {
    let item = match body.get("items") {
        Some(Value::Object(items)) => items.get("item"),
        _ => None,
    };
    match item {
        Some(Value::Array(list)) => list.iter().cloned().filter_map(RawRow::from_value).collect(),
        Some(obj @ Value::Object(_)) => RawRow::from_value(obj.clone()).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn parse_count(v: &Value) -> u64 {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().replace(',', "").parse().unwrap_or(0),
        _ => 0,
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Auth failure hidden in a non-JSON body: the gateway's XML fault document,
/// or a bare message string.
fn auth_signature(body: &str) -> Option<String> {
    if body.starts_with('<') {
        let fault = read_gateway_fault(body).ok()?;
        let msg_hit = fault
            .auth_msg
            .as_deref()
            .filter(|m| AUTH_MESSAGES.iter().any(|a| m.contains(a)));
        let code_hit = fault
            .reason_code
            .as_deref()
            .filter(|c| AUTH_REASON_CODES.contains(c));
        if msg_hit.is_some() || code_hit.is_some() {
            return Some(fault.describe());
        }
        return None;
    }

    if body.starts_with('{') || body.starts_with('[') {
        return None;
    }
    AUTH_MESSAGES
        .iter()
        .find(|a| body.contains(*a))
        .map(|a| a.to_string())
}

#[derive(Debug, Default)]
struct GatewayFault {
    err_msg: Option<String>,
    auth_msg: Option<String>,
    reason_code: Option<String>,
}

impl GatewayFault {
    fn describe(&self) -> String {
        format!(
            "{} (reason {})",
            self.auth_msg.as_deref().or(self.err_msg.as_deref()).unwrap_or("unknown"),
            self.reason_code.as_deref().unwrap_or("-"),
        )
    }
}

/// Pulls the fault fields out of an `<OpenAPI_ServiceResponse>` document.
fn read_gateway_fault(xml: &str) -> Result<GatewayFault, quick_xml::Error> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut fault = GatewayFault::default();
    let mut current: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                current = Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape()?.trim().to_string();
                match current.as_deref() {
                    Some("errMsg") => fault.err_msg = Some(text),
                    Some("returnAuthMsg") => fault.auth_msg = Some(text),
                    Some("returnReasonCode") => fault.reason_code = Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e),
            _ => {}
        }
        buf.clear();
    }
    Ok(fault)
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const AUTH_FAULT: &str = r#"<OpenAPI_ServiceResponse>
    <cmmMsgHeader>
        <errMsg>SERVICE ERROR</errMsg>
        <returnAuthMsg>SERVICE_KEY_IS_NOT_REGISTERED_ERROR</returnAuthMsg>
        <returnReasonCode>30</returnReasonCode>
    </cmmMsgHeader>
</OpenAPI_ServiceResponse>"#;

    #[test]
    fn array_items() {
        let v = json!({ "response": { "body": {
            "totalCount": 2,
            "items": { "item": [ { "flrNo": 1 }, { "flrNo": 2 } ] }
        }}});
        let page = decode_json(&v).unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.rows.len(), 2);
    }

    #[test]
    fn single_object_item_is_one_row() {
        let v = json!({ "response": { "body": {
            "totalCount": "1",
            "items": { "item": { "flrNo": 1 } }
        }}});
        let page = decode_json(&v).unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.rows.len(), 1);
    }

    #[test]
    fn missing_or_blank_items() {
        let v = json!({ "response": { "body": { "totalCount": 0, "items": "" } } });
        assert!(decode_json(&v).unwrap().is_empty());
        let v = json!({ "response": { "body": { "totalCount": 0, "items": { "item": null } } } });
        assert!(decode_json(&v).unwrap().is_empty());
        let v = json!({ "response": { "body": { "totalCount": "0" } } });
        assert!(decode_json(&v).unwrap().is_empty());
    }

    #[test]
    fn xml_auth_fault_is_auth() {
        let err = decode(&UpstreamResponse::ok(AUTH_FAULT)).unwrap_err();
        match err {
            ReconcileError::Auth(msg) => assert!(msg.contains("SERVICE_KEY_IS_NOT_REGISTERED_ERROR")),
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[test]
    fn other_xml_is_malformed() {
        let body = "<OpenAPI_ServiceResponse><cmmMsgHeader><returnReasonCode>99</returnReasonCode></cmmMsgHeader></OpenAPI_ServiceResponse>";
        let err = decode(&UpstreamResponse::ok(body)).unwrap_err();
        assert!(matches!(err, ReconcileError::MalformedResponse(_)));
    }

    #[test]
    fn html_is_malformed() {
        let err = decode(&UpstreamResponse::ok("<html><body>Gateway</body></html>")).unwrap_err();
        assert!(matches!(err, ReconcileError::MalformedResponse(_)));
    }

    #[test]
    fn status_codes() {
        let forbidden = UpstreamResponse { status: 403, body: String::new() };
        assert!(matches!(decode(&forbidden), Err(ReconcileError::Auth(_))));
        let down = UpstreamResponse { status: 502, body: "bad gateway".into() };
        assert!(matches!(decode(&down), Err(ReconcileError::Http { status: 502, .. })));
    }

    #[test]
    fn error_status_with_json_auth_code_is_auth() {
        let body = json!({ "response": { "header": {
            "resultCode": "30",
            "resultMsg": "SERVICE_KEY_IS_NOT_REGISTERED_ERROR"
        }}});
        let rejected = UpstreamResponse { status: 500, body: body.to_string() };
        assert!(matches!(decode(&rejected), Err(ReconcileError::Auth(_))));

        let other = json!({ "response": { "header": { "resultCode": "99" } } });
        let failed = UpstreamResponse { status: 500, body: other.to_string() };
        assert!(matches!(decode(&failed), Err(ReconcileError::Http { status: 500, .. })));
    }

    #[test]
    fn header_result_codes() {
        let v = json!({ "response": { "header": { "resultCode": "30", "resultMsg": "key" } } });
        assert!(matches!(decode_json(&v), Err(ReconcileError::Auth(_))));
        let v = json!({ "response": { "header": { "resultCode": "03", "resultMsg": "NODATA_ERROR" } } });
        assert!(decode_json(&v).unwrap().is_empty());
        let v = json!({ "response": { "header": { "resultCode": "99" } } });
        assert!(matches!(decode_json(&v), Err(ReconcileError::MalformedResponse(_))));
    }

    #[test]
    fn missing_body_is_malformed() {
        let v = json!({ "response": { "header": { "resultCode": "00" } } });
        assert!(matches!(decode_json(&v), Err(ReconcileError::MalformedResponse(_))));
    }
}
