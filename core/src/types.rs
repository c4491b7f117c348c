//! Resource DTOs for the AMP360 API.
//!
//! # Design
//! Field names follow the API's JSON exactly, which mixes camelCase with a
//! few PascalCase foreign keys (`ClientId`, `AppTemplateId`). Structs are
//! `#[serde(default)]` so partially populated rows decode; fields the API is
//! known to send as `null` are `Option`s.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::endpoint::QueryParams;

/// Page of rows as returned by every list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page<T> {
    pub count: u64,
    pub rows: Vec<T>,
}

pub type TerminalList = Page<Terminal>;
pub type TemplateList = Page<Template>;
pub type ModelList = Page<TerminalModel>;
pub type CompanyList = Page<Company>;

// ---------------------------------------------------------------------------
// Terminals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Terminal {
    pub id: u64,
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    pub status: String,
    pub name: String,
    pub imei: Option<String>,
    #[serde(rename = "ethernetMAC")]
    pub ethernet_mac: Option<String>,
    #[serde(rename = "wifiMAC")]
    pub wifi_mac: Option<String>,
    #[serde(rename = "bluetoothMAC")]
    pub bluetooth_mac: Option<String>,
    #[serde(rename = "cloudAuthCode")]
    pub cloud_auth_code: Option<Value>,
    #[serde(rename = "queueFirmware")]
    pub queue_firmware: bool,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "AppTemplateId")]
    pub app_template_id: Option<u64>,
    #[serde(rename = "ClientId")]
    pub client_id: Option<String>,
    #[serde(rename = "FirmwareId")]
    pub firmware_id: Option<String>,
    #[serde(rename = "TerminalModelId")]
    pub terminal_model_id: Option<String>,
    #[serde(rename = "AppTemplate")]
    pub app_template: Option<TemplateRef>,
    #[serde(rename = "Client")]
    pub client: Option<CompanyRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateRef {
    pub id: u64,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyRef {
    pub id: String,
    pub name: String,
    #[serde(rename = "originPath", skip_serializing_if = "Option::is_none")]
    pub origin_path: Option<String>,
}

/// Filters for `GET terminals`; zero-valued fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TerminalsQuery {
    pub id: u64,
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    pub tid: String,
    pub mid: String,
    pub size: u32,
    pub page: u32,
}

impl QueryParams for TerminalsQuery {}

/// Body for creating or updating a terminal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTerminal {
    #[serde(rename = "modelId")]
    pub model_id: String,
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    pub name: String,
    #[serde(rename = "clientId", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(rename = "templateId", default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatedTerminal {
    pub id: u64,
    #[serde(rename = "AppTemplateId")]
    pub app_template_id: Option<u64>,
    #[serde(rename = "ClientId")]
    pub client_id: Option<String>,
    #[serde(rename = "FirmwareId")]
    pub firmware_id: Option<String>,
    #[serde(rename = "TerminalModelId")]
    pub terminal_model_id: Option<String>,
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    pub name: String,
    pub status: String,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Lookup for `GET terminals/details`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TerminalDetailsQuery {
    pub id: u64,
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
}

impl QueryParams for TerminalDetailsQuery {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalDetails {
    #[serde(rename = "templateDetails")]
    pub template_details: Vec<TemplateDetail>,
    pub terminal: TerminalInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateDetail {
    pub id: u64,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "AppTemplateId")]
    pub app_template_id: Option<u64>,
    #[serde(rename = "ApplicationId")]
    pub application_id: Option<String>,
    #[serde(rename = "AppTemplate")]
    pub app_template: Option<TemplateRef>,
    #[serde(rename = "Application")]
    pub application: Option<Application>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Application {
    pub id: String,
    pub name: String,
    pub version: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Terminal as embedded in a details response; several hardware fields are
/// untyped upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalInfo {
    pub id: u64,
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    pub status: String,
    pub name: String,
    pub imei: Option<Value>,
    #[serde(rename = "ethernetMAC")]
    pub ethernet_mac: Option<Value>,
    #[serde(rename = "wifiMAC")]
    pub wifi_mac: Option<Value>,
    #[serde(rename = "bluetoothMAC")]
    pub bluetooth_mac: Option<Value>,
    #[serde(rename = "cloudAuthCode")]
    pub cloud_auth_code: Option<String>,
    #[serde(rename = "queueFirmware")]
    pub queue_firmware: i64,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "AppTemplateId")]
    pub app_template_id: Option<u64>,
    #[serde(rename = "ClientId")]
    pub client_id: Option<String>,
    #[serde(rename = "FirmwareId")]
    pub firmware_id: Option<String>,
    #[serde(rename = "TerminalModelId")]
    pub terminal_model_id: Option<String>,
    #[serde(rename = "Firmware")]
    pub firmware: Option<Firmware>,
    #[serde(rename = "TerminalModel")]
    pub terminal_model: Option<TerminalModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Firmware {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(rename = "isLatest")]
    pub is_latest: i64,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    pub id: u64,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "ClientId")]
    pub client_id: String,
    #[serde(rename = "parentId")]
    pub parent_id: Option<Value>,
    #[serde(rename = "Client")]
    pub client: CompanyRef,
    #[serde(rename = "Applications")]
    pub applications: Vec<Application>,
    #[serde(rename = "parentInfo")]
    pub parent_info: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplatesQuery {
    pub size: u32,
    pub page: u32,
}

impl QueryParams for TemplatesQuery {}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Parameter set of a template or terminal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamSet {
    pub categories: Vec<ParamCategory>,
    pub count: u64,
    pub rows: Vec<Param>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamCategory {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Param {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub tag: String,
    pub name: String,
    pub hint: Option<String>,
    pub validator: Option<String>,
    #[serde(rename = "visibleOnTemplate")]
    pub visible_on_template: i64,
    #[serde(rename = "visibleOnTerminal")]
    pub visible_on_terminal: i64,
    #[serde(rename = "editableOnTerminal")]
    pub editable_on_terminal: i64,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "ApplicationId")]
    pub application_id: Option<String>,
    #[serde(rename = "ParamCategoryId")]
    pub param_category_id: Option<String>,
    #[serde(rename = "categoryName")]
    pub category_name: Option<String>,
    pub value: Option<String>,
    #[serde(rename = "defaultValue")]
    pub default_value: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Category filter for parameter listings; an empty id lists every category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParamsQuery {
    #[serde(rename = "categoryId")]
    pub category_id: String,
}

impl QueryParams for ParamsQuery {
    const REQUIRED: &'static [&'static str] = &["categoryId"];
}

/// Tags applied and tags rejected by a parameter bulk update.
pub type ParamUpdate = crate::processor::BulkUpdate<Vec<String>, Vec<String>>;

// ---------------------------------------------------------------------------
// Models and companies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalModel {
    pub id: String,
    pub name: String,
    #[serde(rename = "hardwareId")]
    pub hardware_id: String,
    #[serde(rename = "jointName", skip_serializing_if = "Option::is_none")]
    pub joint_name: Option<String>,
    #[serde(rename = "maintenanceInterval", skip_serializing_if = "Option::is_none")]
    pub maintenance_interval: Option<u32>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Paging for child companies; both keys are always sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompaniesQuery {
    pub size: u32,
    pub page: u32,
}

impl QueryParams for CompaniesQuery {
    const REQUIRED: &'static [&'static str] = &["size", "page"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_row_decodes_with_null_parent() {
        let raw = r#"{"id":1,"name":"APITEST","createdAt":"2021-11-18T06:17:45.000Z","updatedAt":"2021-11-18T06:17:45.000Z","ClientId":"ce16c215-e5a2-4ce6-9429-3bea82624a87","parentId":null,"Client":{"id":"ce16c215-e5a2-4ce6-9429-3bea82624a87","name":"TEST"},"Applications":[{"name":"TEST","version":"02.03.029","state":"Production","id":"766d0d8f-a0fd-4fa6-97e3-e44028305ba3","createdAt":"2021-11-10T06:15:53.000Z","fileName":"test.apk"}],"parentInfo":null}"#;
        let template: Template = serde_json::from_str(raw).unwrap();
        assert_eq!(template.name, "APITEST");
        assert_eq!(template.parent_id, None);
        assert_eq!(template.applications[0].file_name.as_deref(), Some("test.apk"));
        assert_eq!(
            template.created_at.unwrap().to_rfc3339(),
            "2021-11-18T06:17:45+00:00"
        );
    }

    #[test]
    fn terminal_param_with_null_file_path_decodes() {
        let raw = r#"{"id":3104508,"type":"STRING","tag":"ACQS._1.ACQINFO.MERCHANTID","name":"ACQS._1.ACQINFO.MERCHANTID","hint":"","validator":"","value":"400081203","defaultValue":"000000000","visibleOnTemplate":1,"visibleOnTerminal":1,"filePath":null,"ApplicationId":"c250f201-4d0b-42d3-aeb0-3c8804e4684a","ParamCategoryId":"c2f7c244-ebd7-4ce3-bcf6-adffd2e4ec90","categoryName":"TERMINAL"}"#;
        let param: Param = serde_json::from_str(raw).unwrap();
        assert_eq!(param.id, 3104508);
        assert_eq!(param.file_path, None);
        assert_eq!(param.value.as_deref(), Some("400081203"));
        assert_eq!(param.created_at, None);
    }

    #[test]
    fn new_terminal_omits_unset_optionals() {
        let body = NewTerminal {
            model_id: "test1".to_string(),
            serial_number: "SN-1".to_string(),
            name: "Front desk".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["modelId"], "test1");
        assert!(json.get("clientId").is_none());
        assert!(json.get("templateId").is_none());
        assert_eq!(json["parameters"], serde_json::json!({}));
    }

    #[test]
    fn paging_and_category_keys_are_always_sent() {
        let resolver = crate::endpoint::EndpointResolver::new("http://x/v1").unwrap();
        let companies = resolver
            .resolve("client/children", Some(&CompaniesQuery::default()))
            .unwrap();
        assert_eq!(companies.as_str(), "http://x/v1/client/children?size=0&page=0");

        let params = resolver
            .resolve("templates/params/1", Some(&ParamsQuery::default()))
            .unwrap();
        assert_eq!(params.as_str(), "http://x/v1/templates/params/1?categoryId=");

        let templates = resolver
            .resolve("templates", Some(&TemplatesQuery::default()))
            .unwrap();
        assert_eq!(templates.as_str(), "http://x/v1/templates");
    }

    #[test]
    fn model_list_decodes() {
        let raw = r#"{"count":1,"rows":[{"name":"TEST1","id":"test1","hardwareId":"CD","maintenanceInterval":180,"jointName":"TEST1-CD","createdAt":"2021-10-30T00:55:39.000Z"}]}"#;
        let models: ModelList = serde_json::from_str(raw).unwrap();
        assert_eq!(models.count, 1);
        assert_eq!(models.rows[0].maintenance_interval, Some(180));
    }
}
