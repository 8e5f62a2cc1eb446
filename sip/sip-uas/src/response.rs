use crate::transport::IncomingRequest;
use crate::util::random_string;
use sip_types::header::typed::FromTo;
use sip_types::msg::Response;
use sip_types::print::AppendCtx;
use sip_types::uri::{NameAddr, SipUri};
use sip_types::{Method, Name, StatusCode};

/// Create a response to `request` with the given status code.
///
/// Copies the headers identifying the transaction and tags the `To` header of final responses.
pub(crate) fn create_response(request: &IncomingRequest, code: StatusCode) -> Response {
    let mut response = Response::new(code);

    // missing headers are not copied
    for name in [Name::VIA, Name::FROM] {
        let _ = request.headers.clone_into(&mut response.headers, name);
    }

    match request.headers.get::<FromTo>(Name::TO) {
        Ok(mut to) if code.is_final() && to.tag.is_none() => {
            to.tag = Some(random_string());
            response.headers.insert(Name::TO, to.default_print_ctx());
        }
        Ok(_) => {
            let _ = request.headers.clone_into(&mut response.headers, Name::TO);
        }
        Err(e) if e.is_missing() => {}
        Err(e) => {
            log::debug!("copying unparsable To header as is, {e}");
            let _ = request.headers.clone_into(&mut response.headers, Name::TO);
        }
    }

    for name in [Name::CALL_ID, Name::CSEQ] {
        let _ = request.headers.clone_into(&mut response.headers, name);
    }

    response
}

/// 200 OK for a served method.
///
/// INVITE gets `contact` or the request-uri as Contact, REGISTER echoes the bindings,
/// REGISTER and SUBSCRIBE echo Expires.
pub(crate) fn success_response(request: &IncomingRequest, contact: Option<&SipUri>) -> Response {
    let mut response = create_response(request, StatusCode::OK);

    let method = &request.line.method;

    if *method == Method::INVITE {
        let contact = NameAddr::uri(contact.unwrap_or(&request.line.uri).clone());

        response
            .headers
            .insert(Name::CONTACT, contact.default_print_ctx());
    }

    if *method == Method::REGISTER {
        let _ = request
            .headers
            .clone_into(&mut response.headers, Name::CONTACT);
    }

    if *method == Method::REGISTER || *method == Method::SUBSCRIBE {
        let _ = request
            .headers
            .clone_into(&mut response.headers, Name::EXPIRES);
    }

    response
}

#[cfg(test)]
mod test {
    use super::*;
    use bytes::Bytes;
    use sip_types::header::typed::Expires;

    fn request(raw: &'static str) -> IncomingRequest {
        IncomingRequest::parse(Bytes::from_static(raw.as_bytes())).unwrap()
    }

    #[test]
    fn copies_transaction_headers() {
        let request = request(
            "REGISTER sip:drachtio.org SIP/2.0\r\n\
             Via: SIP/2.0/UDP 10.0.0.1:5060;branch=z9hG4bK776\r\n\
             Via: SIP/2.0/UDP 10.0.0.2:5060;branch=z9hG4bK123\r\n\
             From: <sip:dhorton@drachtio.org>;tag=1928301774\r\n\
             To: <sip:dhorton@drachtio.org>\r\n\
             Call-ID: a84b4c76e66710\r\n\
             CSeq: 1 REGISTER\r\n\
             Contact: <sip:dhorton@10.0.0.1:5060>\r\n\
             Expires: 3600\r\n\
             Max-Forwards: 70\r\n\r\n",
        );

        let response = success_response(&request, None);

        assert_eq!(response.code(), StatusCode::OK);

        let vias: Vec<_> = response
            .headers
            .iter()
            .filter(|(name, _)| **name == Name::VIA)
            .collect();
        assert_eq!(vias.len(), 2);

        assert_eq!(
            response.headers.get_raw(&Name::FROM).unwrap().as_str(),
            "<sip:dhorton@drachtio.org>;tag=1928301774"
        );

        let to = response.headers.get_raw(&Name::TO).unwrap().as_str();
        assert!(to.starts_with("<sip:dhorton@drachtio.org>;tag="));

        assert_eq!(response.headers.get_raw(&Name::CALL_ID).unwrap().as_str(), "a84b4c76e66710");
        assert_eq!(response.headers.get_raw(&Name::CSEQ).unwrap().as_str(), "1 REGISTER");
        assert!(response.headers.contains(&Name::CONTACT));
        assert_eq!(response.headers.get_named::<Expires>().unwrap(), Expires(3600));
        assert!(!response.headers.contains(&Name::MAX_FORWARDS));
    }

    #[test]
    fn existing_tag_is_kept() {
        let request = request(
            "BYE sip:dhorton@drachtio.org SIP/2.0\r\n\
             To: <sip:dhorton@drachtio.org;transport=udp>;tag=abc\r\n\
             Call-ID: a84b4c76e66710\r\n\
             CSeq: 2 BYE\r\n\r\n",
        );

        let response = success_response(&request, None);

        assert_eq!(
            response.headers.get_raw(&Name::TO).unwrap().as_str(),
            "<sip:dhorton@drachtio.org;transport=udp>;tag=abc"
        );
        assert!(!response.headers.contains(&Name::CONTACT));
    }

    #[test]
    fn provisional_response_is_not_tagged() {
        let request = request(
            "INVITE sip:dhorton@drachtio.org SIP/2.0\r\n\
             To: <sip:dhorton@drachtio.org>\r\n\
             Call-ID: a84b4c76e66710\r\n\
             CSeq: 1 INVITE\r\n\r\n",
        );

        let response = create_response(&request, StatusCode::TRYING);

        assert_eq!(
            response.headers.get_raw(&Name::TO).unwrap().as_str(),
            "<sip:dhorton@drachtio.org>"
        );
    }

    #[test]
    fn invite_contact_is_the_uas() {
        let request = request(
            "INVITE sip:dhorton@drachtio.org SIP/2.0\r\n\
             To: <sip:dhorton@drachtio.org>\r\n\
             Call-ID: a84b4c76e66710\r\n\
             CSeq: 1 INVITE\r\n\
             Contact: <sip:caller@10.9.9.9:5060>\r\n\r\n",
        );

        let response = success_response(&request, None);
        assert_eq!(
            response.headers.get_raw(&Name::CONTACT).unwrap().as_str(),
            "<sip:dhorton@drachtio.org>"
        );

        let local: SipUri = "sip:uas@10.0.0.5:5080".parse().unwrap();
        let response = success_response(&request, Some(&local));
        assert_eq!(
            response.headers.get_raw(&Name::CONTACT).unwrap().as_str(),
            "<sip:uas@10.0.0.5:5080>"
        );
    }
}
