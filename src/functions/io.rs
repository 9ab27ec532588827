use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;

use log::warn;

use super::{Applied, Builtin, FunctionContext, add, empty, has_min_args, number, ok, text};
use crate::context::MailMessage;
use crate::evaluator::EvalError;
use crate::value::Value;

pub(super) fn register(map: &mut HashMap<&'static str, Builtin>) {
    add(map, "store", "Usage: ${store(key, value)}. Example: ${store('tmp', this.name)}", func_store);
    add(map, "retrieve", "Usage: ${retrieve(key)}. Example: ${retrieve('tmp')}", func_retrieve);
    add(map, "inc_counter", "Usage: ${inc_counter(level)}. Example: ${inc_counter(1)}", func_inc_counter);
    add(map, "get_counter", "Usage: ${get_counter(level)}. Example: ${get_counter(1)}", func_get_counter);
    add(map, "reset_counter", "Usage: ${reset_counter(level)}. Example: ${reset_counter(1)}", func_reset_counter);
    add(map, "print", "Usage: ${print(values...)}. Example: ${print(this.name)}", func_print);
    add(map, "log", "Usage: ${log(values...)}. Example: ${log('processing ', this.id)}", func_log);
    add(map, "read", "Usage: ${read(filename)}. Example: ${read('import.csv')}", func_read);
    add(map, "write", "Usage: ${write(filename, values...)}. Example: ${write('export.txt', this.name)}", func_write);
    add(map, "append", "Usage: ${append(filename, values...)}. Example: ${append('log.txt', this.name)}", func_append);
    add(map, "send_plaintext_mail", "Usage: ${send_plaintext_mail(fromAddress, fromName, toAddress, toName, subject, content)}.", func_send_plaintext_mail);
    add(map, "send_html_mail", "Usage: ${send_html_mail(fromAddress, fromName, toAddress, toName, subject, content)}.", func_send_html_mail);
    add(map, "geocode", "Usage: ${geocode(street, city, country)}. Example: ${geocode(this.street, this.city, this.country)}", func_geocode);
}

fn func_store(fc: &FunctionContext, args: &[Value]) -> Applied {
    if args.len() < 2 {
        return empty();
    }
    fc.ctx.store(&args[0].string_form(), args[1].clone());
    empty()
}

fn func_retrieve(fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    ok(fc
        .ctx
        .retrieve(&args[0].string_form())
        .unwrap_or(Value::Null))
}

fn counter_level(args: &[Value]) -> Option<u32> {
    match args.first()?.to_number() {
        Ok(n) if n >= 0.0 => Some(n as u32),
        _ => None,
    }
}

fn func_inc_counter(fc: &FunctionContext, args: &[Value]) -> Applied {
    match counter_level(args) {
        Some(level) => {
            fc.ctx.increment_counter(level);
            empty()
        }
        None => empty(),
    }
}

fn func_get_counter(fc: &FunctionContext, args: &[Value]) -> Applied {
    match counter_level(args) {
        Some(level) => number(fc.ctx.counter(level)),
        None => empty(),
    }
}

fn func_reset_counter(fc: &FunctionContext, args: &[Value]) -> Applied {
    match counter_level(args) {
        Some(level) => {
            fc.ctx.reset_counter(level);
            empty()
        }
        None => empty(),
    }
}

/// Append the string forms of all arguments to the context's output
/// buffer. The embedding caller decides where that buffer ends up.
fn func_print(fc: &FunctionContext, args: &[Value]) -> Applied {
    for arg in args {
        fc.ctx.print(&arg.string_form());
    }
    empty()
}

fn func_log(_fc: &FunctionContext, args: &[Value]) -> Applied {
    let joined: String = args.iter().map(|a| a.string_form()).collect();
    log::info!("{}", joined);
    empty()
}

/// Read a file from the exchange directory. A missing or unreadable file
/// degrades to an empty result; only the sandbox itself is strict.
fn func_read(fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    let path = fc.ctx.settings().exchange_path(&args[0].string_form());
    match std::fs::read_to_string(&path) {
        Ok(content) => text(content),
        Err(e) => {
            warn!("read(): cannot read {}: {}", path.display(), e);
            empty()
        }
    }
}

/// Write the string forms of the remaining arguments to a new file in the
/// exchange directory. Refuses to overwrite: an existing file is a
/// structured error, `append` is the sanctioned way to add to one.
fn func_write(fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    let path = fc.ctx.settings().exchange_path(&args[0].string_form());
    if path.exists() {
        return Err(EvalError::Io {
            message: format!("write(): file '{}' already exists", path.display()),
        });
    }
    let content: String = args[1..].iter().map(|a| a.string_form()).collect();
    std::fs::write(&path, content)?;
    empty()
}

fn func_append(fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    let path = fc.ctx.settings().exchange_path(&args[0].string_form());
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    let content: String = args[1..].iter().map(|a| a.string_form()).collect();
    file.write_all(content.as_bytes())?;
    empty()
}

fn func_send_plaintext_mail(fc: &FunctionContext, args: &[Value]) -> Applied {
    send_mail(fc, args, false)
}

fn func_send_html_mail(fc: &FunctionContext, args: &[Value]) -> Applied {
    send_mail(fc, args, true)
}

/// Outbound mail goes through the gateway collaborator, synchronously. A
/// missing gateway or a transport failure is logged and degrades to an
/// empty result.
fn send_mail(fc: &FunctionContext, args: &[Value], html: bool) -> Applied {
    if !has_min_args(args, 6) {
        return empty();
    }
    let Some(gateway) = fc.ctx.mail() else {
        warn!("send mail: no mail gateway configured");
        return empty();
    };
    let message = MailMessage {
        from_address: args[0].string_form(),
        from_name: args[1].string_form(),
        to_address: args[2].string_form(),
        to_name: args[3].string_form(),
        subject: args[4].string_form(),
        content: args[5].string_form(),
        html,
    };
    if let Err(e) = gateway.send(message) {
        warn!("send mail: transport failed: {}", e);
    }
    empty()
}

/// Geocode an address to an object with `latitude` and `longitude`. The
/// lookup blocks inline with evaluation; there is no timeout here.
fn func_geocode(fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 3) {
        return empty();
    }
    let Some(geocoder) = fc.ctx.geocoder() else {
        warn!("geocode(): no geocoder configured");
        return empty();
    };
    let street = args[0].string_form();
    let city = args[1].string_form();
    let country = args[2].string_form();
    match geocoder.geocode(&street, &city, &country) {
        Some((latitude, longitude)) => {
            let mut result = HashMap::new();
            result.insert("latitude".to_string(), Value::Number(latitude));
            result.insert("longitude".to_string(), Value::Number(longitude));
            ok(Value::Object(result))
        }
        None => empty(),
    }
}
