#![allow(dead_code)]

use rtc_core::config::ServerConfig;
use rtc_core::transport::{Exchange, HttpRequest, HttpResponse};
use rtc_core::{Client, Identity, RtcError};
use std::collections::VecDeque;

/// Exchange that answers from scripted routes and records every request.
///
/// A route matches when its fragment occurs in the request URL; routes are
/// tried in the order they were added. A route's last response is sticky.
#[derive(Default)]
pub struct Scripted {
    routes: Vec<(String, VecDeque<HttpResponse>)>,
    pub requests: Vec<HttpRequest>,
}

impl Scripted {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, fragment: &str, response: HttpResponse) -> Self {
        if let Some((_, queue)) = self.routes.iter_mut().find(|(f, _)| f == fragment) {
            queue.push_back(response);
        } else {
            self.routes
                .push((fragment.to_string(), VecDeque::from([response])));
        }
        self
    }

    pub fn on_xml(self, fragment: &str, xml: &str) -> Self {
        self.on(fragment, ok(xml))
    }

    pub fn requests_to(&self, fragment: &str) -> Vec<&HttpRequest> {
        self.requests
            .iter()
            .filter(|r| r.url.contains(fragment))
            .collect()
    }
}

impl Exchange for Scripted {
    fn exchange(&mut self, request: &HttpRequest) -> Result<HttpResponse, RtcError> {
        self.requests.push(request.clone());
        let route = self
            .routes
            .iter_mut()
            .find(|(fragment, _)| request.url.contains(fragment.as_str()));

        match route {
            Some((_, queue)) if queue.len() > 1 => Ok(queue.pop_front().expect("non-empty")),
            Some((_, queue)) => Ok(queue.front().cloned().expect("route has a response")),
            None => Err(RtcError::Transport {
                url: request.url.clone(),
                message: "no scripted response".into(),
            }),
        }
    }
}

pub const OWNER_ID: &str = "_PrOIoMZ5Ed-Lr-wDR3V_pA";

pub fn client(exchange: Scripted) -> Client<Scripted> {
    Client::with_exchange(
        exchange,
        ServerConfig {
            base_url: "https://jazz.example.com/jazz".into(),
            ..ServerConfig::default()
        },
        Identity {
            user: "fcoury".into(),
            password: "s3cret".into(),
            owner_id: OWNER_ID.into(),
        },
    )
}

pub fn ok(xml: &str) -> HttpResponse {
    HttpResponse::new(200, Vec::new(), xml.as_bytes().to_vec())
}

pub fn status(code: u16) -> HttpResponse {
    HttpResponse::new(code, Vec::new(), b"<html>error</html>".to_vec())
}

/// Route fragments for the endpoints the client calls.
pub mod route {
    pub const LOGIN_CHECK: &str = "j_security_check";
    pub const INITIALIZER: &str = "IWebUIInitializerRestService/";
    pub const RESULT_SET: &str = "getResultSet";
    pub const SEARCH: &str = "results?maxResults=";
    pub const ALLOCATE: &str = "newWorkItem=true";
    pub const SAVE: &str = "/workItem2";
    pub const ITERATIONS: &str = "iterations?uuid=";
    pub const ALL_VALUES: &str = "allValues?";

    pub fn retrieve(id: &str) -> String {
        format!("results?id={id}&")
    }

    pub fn detail(id: &str) -> String {
        format!("workItemDTO2?includeHistory=false&id={id}&")
    }
}

pub fn envelope(return_value: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<soapenv:Body>
<response>
<method>call</method>
<interface>com.ibm.team.workitem.common.internal.rest.IWorkItemRestService</interface>
<returnValue>
{return_value}
</returnValue>
</response>
</soapenv:Body>
</soapenv:Envelope>"#
    )
}

pub fn attribute(key: &str, label: &str, content: &str) -> String {
    format!(
        "<attributes><key>{key}</key><value><id></id><label>{label}</label><content>{content}</content></value></attributes>"
    )
}

/// Retrieve or search response carrying the given hits.
pub fn hits(items: &[(&str, &str, &str)]) -> String {
    let dtos: String = items
        .iter()
        .map(|(id, summary, kind)| {
            format!(
                "<workItemSummaryDTOs><id>{id}</id><workItemItemId>_item{id}</workItemItemId>\
                 <summary>{summary}</summary><ownerName>Felipe Coury</ownerName>\
                 <creatorName>Marcelo De Campos</creatorName><typeName>{kind}</typeName>\
                 <stateName>New</stateName>\
                 <locationUri>https://jazz.example.com/jazz/resource/itemName/com.ibm.team.workitem.WorkItem/{id}</locationUri>\
                 <description>&lt;p&gt;details&lt;/p&gt;</description></workItemSummaryDTOs>"
            )
        })
        .collect();
    envelope(&format!("<value>{dtos}</value>"))
}

/// Detail read with an `internalState` label.
pub fn detail(id: &str, state: &str) -> String {
    envelope(&format!(
        "<value><itemId>_item{id}</itemId><stateId>_state{id}</stateId>{}{}{}</value>",
        attribute("internalState", state, ""),
        attribute("duration", "", "8 hours"),
        attribute("target", "[2014] February R1, S1", "_it1"),
    ))
}

/// Save response echoing the saved item's state.
pub fn saved(id: &str, state: &str) -> String {
    envelope(&format!(
        "<value><workItem><id>{id}</id><itemId>_item{id}</itemId>{}</workItem></value>",
        attribute("internalState", state, ""),
    ))
}

/// Release list with `count` iterations spread over two releases.
pub fn releases(count: usize) -> String {
    let iteration = |n: usize| {
        format!(
            "<iterations><id>s{n}</id><itemId>_it{n}</itemId><label>Sprint {n}</label>\
             <completed>false</completed><archived>false</archived></iterations>"
        )
    };
    let split = count / 2;
    let first: String = (0..split).map(iteration).collect();
    let second: String = (split..count).map(iteration).collect();
    envelope(&format!(
        r#"<values xsi:type="process.restDTO:ReleaseDTO"><id>r1</id><itemId>_r1</itemId><label>R1</label>{first}</values><values xsi:type="process.restDTO:ReleaseDTO"><id>r2</id><itemId>_r2</itemId><label>R2</label>{second}</values>"#
    ))
}
