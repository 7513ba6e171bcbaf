//! JSONL request/response loop over stdin/stdout.
//!
//! One session, one sheet. Each input line is one `Request`; each output
//! line is exactly one `Response`. Malformed lines get a wire-level error
//! response and the loop continues — only I/O failures abort it.
//!
//! The loop calls the engine through the same four operations every other
//! client uses; swapping the local engine for a remote compute service
//! changes nothing on the wire.

use std::io::{self, BufRead, Write};

use valvesheet_engine::engine::SheetEngine;
use valvesheet_engine::sheet::Sheet;
use valvesheet_protocol::{
    ErrorResponse, ParamsResponse, Request, Response, SheetResponse, ValueResponse,
};

use crate::wire;

pub fn run(engine: &SheetEngine, verbose: bool) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();

    let mut sheet = match engine.create_sheet() {
        Ok(sheet) => sheet,
        Err(err) => {
            let resp = Response::Error(wire::error_response(String::new(), &err));
            write_line(&mut stdout.lock(), &resp)?;
            return Ok(());
        }
    };

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle(engine, &mut sheet, request, verbose),
            Err(err) => Response::Error(ErrorResponse {
                id: String::new(),
                kind: "malformed_request".to_string(),
                key: String::new(),
                message: err.to_string(),
            }),
        };

        write_line(&mut stdout.lock(), &resp)?;
    }

    Ok(())
}

fn write_line(out: &mut impl Write, resp: &Response) -> io::Result<()> {
    let json = serde_json::to_string(resp)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    writeln!(out, "{}", json)?;
    out.flush()
}

fn handle(engine: &SheetEngine, sheet: &mut Sheet, request: Request, verbose: bool) -> Response {
    match request {
        Request::CreateSheet(req) => match engine.create_sheet() {
            Ok(fresh) => {
                *sheet = fresh;
                sheet_response(engine, sheet, req.id)
            }
            Err(err) => Response::Error(wire::error_response(req.id, &err)),
        },
        Request::SetInput(req) => {
            let key = match engine.resolve(&req.key) {
                Ok(key) => key,
                Err(err) => return Response::Error(wire::error_response(req.id, &err)),
            };
            match engine.set_input(sheet, key, wire::param_value(&req.value)) {
                Ok(outcome) => {
                    if verbose {
                        eprintln!("{}", outcome.report.log_line());
                    }
                    sheet_response(engine, sheet, req.id)
                }
                Err(err) => Response::Error(wire::error_response(req.id, &err)),
            }
        }
        Request::Get(req) => {
            let key = match engine.resolve(&req.key) {
                Ok(key) => key,
                Err(err) => return Response::Error(wire::error_response(req.id, &err)),
            };
            match engine.get(sheet, key) {
                Ok(value) => Response::Value(ValueResponse {
                    id: req.id,
                    key: req.key,
                    value: wire::wire_value(value),
                }),
                Err(err) => Response::Error(wire::error_response(req.id, &err)),
            }
        }
        Request::Snapshot(req) => sheet_response(engine, sheet, req.id),
        Request::Params(req) => Response::Params(ParamsResponse {
            id: req.id,
            params: engine.registry().specs().map(wire::param_info).collect(),
        }),
    }
}

fn sheet_response(engine: &SheetEngine, sheet: &Sheet, id: String) -> Response {
    Response::Sheet(SheetResponse {
        id,
        revision: sheet.revision(),
        values: wire::snapshot_entries(engine, sheet),
    })
}
